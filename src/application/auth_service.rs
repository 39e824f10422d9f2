use crate::domain::backend::{BackendReply, BuyerBackend, CallContext};
use crate::domain::error::DomainError;
use crate::domain::forms::{ForgotPasswordPayload, LoginPayload, RegistrationPayload};
use crate::domain::validation::{
    ValidationErrors, validate_forgot_password_form, validate_login_form,
    validate_registration_form,
};
use std::sync::Arc;
use tracing::{info, instrument, trace, warn};

/// Validates buyer submissions and forwards them, one backend call each.
pub struct AuthProxyService<B: BuyerBackend> {
    backend: Arc<B>,
    validate_submissions: bool,
}

impl<B: BuyerBackend> AuthProxyService<B> {
    pub fn new(backend: Arc<B>, validate_submissions: bool) -> Self {
        Self {
            backend,
            validate_submissions,
        }
    }

    fn gate(&self, errors: impl FnOnce() -> ValidationErrors) -> Result<(), DomainError> {
        if !self.validate_submissions {
            trace!("Submission validation disabled, forwarding as-is");
            return Ok(());
        }
        let errors = errors();
        if errors.is_empty() {
            return Ok(());
        }
        warn!(
            fields = ?errors.fields().collect::<Vec<_>>(),
            "Submission rejected before forwarding"
        );
        Err(DomainError::Validation(errors))
    }

    #[instrument(skip(self, ctx, payload), fields(email = %payload.email))]
    pub async fn login(
        &self,
        ctx: &CallContext,
        payload: LoginPayload,
    ) -> Result<BackendReply, DomainError> {
        self.gate(|| validate_login_form(&payload))?;
        info!("Forwarding login to backend");
        let reply = self.backend.login(ctx, payload).await?;
        info!(status = reply.status, "Backend accepted login");
        Ok(reply)
    }

    #[instrument(skip(self, ctx, payload), fields(email = %payload.email))]
    pub async fn forgot_password(
        &self,
        ctx: &CallContext,
        payload: ForgotPasswordPayload,
    ) -> Result<BackendReply, DomainError> {
        self.gate(|| validate_forgot_password_form(&payload))?;
        info!("Forwarding password reset request to backend");
        let reply = self.backend.forgot_password(ctx, payload).await?;
        info!(status = reply.status, "Backend accepted password reset request");
        Ok(reply)
    }

    #[instrument(
        skip(self, ctx, payload),
        fields(email = %payload.email, has_file = payload.file.is_some())
    )]
    pub async fn register(
        &self,
        ctx: &CallContext,
        payload: RegistrationPayload,
    ) -> Result<BackendReply, DomainError> {
        self.gate(|| validate_registration_form(&payload))?;
        info!("Forwarding buyer registration to backend");
        let reply = self.backend.create_buyer(ctx, payload).await?;
        info!(status = reply.status, "Backend created buyer");
        Ok(reply)
    }
}
