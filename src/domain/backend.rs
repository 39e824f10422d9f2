use crate::domain::error::ForwardError;
use crate::domain::forms::{ForgotPasswordPayload, LoginPayload, RegistrationPayload};
use async_trait::async_trait;
use serde_json::Value;

/// A 2xx answer from the buyer backend.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendReply {
    pub status: u16,
    pub body: Value,
}

/// Correlation data carried on every outbound call.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    pub request_id: Option<String>,
}

/// The remote buyer service. Each method performs exactly one outbound call.
#[async_trait]
pub trait BuyerBackend: Send + Sync {
    async fn login(
        &self,
        ctx: &CallContext,
        payload: LoginPayload,
    ) -> Result<BackendReply, ForwardError>;

    async fn forgot_password(
        &self,
        ctx: &CallContext,
        payload: ForgotPasswordPayload,
    ) -> Result<BackendReply, ForwardError>;

    async fn create_buyer(
        &self,
        ctx: &CallContext,
        payload: RegistrationPayload,
    ) -> Result<BackendReply, ForwardError>;
}
