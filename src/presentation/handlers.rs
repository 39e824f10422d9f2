use crate::application::auth_service::AuthProxyService;
use crate::domain::backend::CallContext;
use crate::domain::error::{DomainError, ForwardError};
use crate::domain::forms::{ForgotPasswordPayload, LoginPayload};
use crate::domain::validation::ValidationErrors;
use crate::infrastructure::backend_client::HttpBuyerBackend;
use crate::presentation::middleware::RequestId;
use crate::presentation::registration_form::{RegistrationFormError, read_registration_form};
use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{FromRequest, HttpMessage, HttpResponse, ResponseError, web};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;
use std::future::{Ready, ready};
use thiserror::Error;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

pub struct AppState {
    pub auth_service: AuthProxyService<HttpBuyerBackend>,
}

/// Which proxy endpoint produced a failure; drives the error body shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Login,
    ForgotPassword,
    Registration,
}

impl Flow {
    pub fn fallback_message(self) -> &'static str {
        match self {
            Flow::Login => "Login failed",
            Flow::ForgotPassword => "Failed to send reset email",
            Flow::Registration => "Registration failed",
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Flow::Login => "login",
            Flow::ForgotPassword => "forgot-password",
            Flow::Registration => "registration",
        };
        f.write_str(name)
    }
}

// Uniform error response format
#[derive(Serialize)]
struct ErrorResponse {
    message: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<ValidationErrors>,
}

impl ErrorResponse {
    fn message(message: &str) -> Self {
        Self {
            message: Value::String(message.to_string()),
            details: None,
            error: None,
            errors: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Validation failed")]
    Validation(ValidationErrors),
    #[error("Unreadable JSON body: {0}")]
    UnreadableJson(String),
    #[error("Unreadable form body: {0}")]
    UnreadableForm(String),
    #[error("Payload too large: {0}")]
    TooLarge(String),
    #[error("{flow} proxy failed: {source}")]
    Forward { flow: Flow, source: ForwardError },
}

impl ProxyError {
    pub fn from_domain(flow: Flow, err: DomainError) -> Self {
        match err {
            DomainError::Validation(errors) => ProxyError::Validation(errors),
            DomainError::Forward(source) => ProxyError::Forward { flow, source },
        }
    }
}

impl From<RegistrationFormError> for ProxyError {
    fn from(err: RegistrationFormError) -> Self {
        match err {
            RegistrationFormError::TooLarge { .. } => ProxyError::TooLarge(err.to_string()),
            RegistrationFormError::Multipart(_) | RegistrationFormError::InvalidText(_) => {
                ProxyError::UnreadableForm(err.to_string())
            }
        }
    }
}

/// The backend's own `message` when it carries one, else the flow fallback.
fn backend_message(body: &Value, fallback: &str) -> Value {
    match body.get("message") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Value::String(fallback.to_string()),
        Some(Value::String(s)) if s.is_empty() => Value::String(fallback.to_string()),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => Value::String(fallback.to_string()),
        Some(message) => message.clone(),
    }
}

impl ResponseError for ProxyError {
    fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::Validation(_) => StatusCode::BAD_REQUEST,
            ProxyError::UnreadableJson(_) | ProxyError::UnreadableForm(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ProxyError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::Forward { flow, source } => match source {
                ForwardError::Backend { status, .. } => {
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
                }
                ForwardError::Connection { .. } if *flow == Flow::Registration => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                ForwardError::Connection { .. } | ForwardError::Unknown { .. } => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        if status.is_server_error() {
            error!(error = %self, status = %status, "Request failed");
        } else {
            warn!(error = %self, status = %status, "Request rejected");
        }

        let body = match self {
            ProxyError::Validation(errors) => ErrorResponse {
                errors: Some(errors.clone()),
                ..ErrorResponse::message("Validation failed")
            },
            ProxyError::UnreadableJson(_) => ErrorResponse::message("Internal server error"),
            ProxyError::UnreadableForm(msg) => ErrorResponse {
                details: Some(json!({ "code": null, "message": msg, "name": "FormDataError" })),
                error: Some("API route error"),
                ..ErrorResponse::message("Internal server error")
            },
            ProxyError::TooLarge(msg) => ErrorResponse {
                details: Some(json!({ "message": msg })),
                ..ErrorResponse::message("Payload too large")
            },
            ProxyError::Forward { flow, source } => match (flow, source) {
                (flow, ForwardError::Backend { body, .. }) => ErrorResponse {
                    message: backend_message(body, flow.fallback_message()),
                    details: Some(body.clone()),
                    error: (*flow == Flow::Registration).then_some("Backend validation failed"),
                    errors: None,
                },
                (Flow::Registration, ForwardError::Connection { code, message }) => {
                    ErrorResponse {
                        details: Some(json!({ "code": code, "message": message })),
                        error: Some("Connection failed"),
                        ..ErrorResponse::message("Backend server is not running or not accessible")
                    }
                }
                (Flow::Registration, ForwardError::Unknown { code, message, name }) => {
                    ErrorResponse {
                        details: Some(json!({ "code": code, "message": message, "name": name })),
                        error: Some("API route error"),
                        ..ErrorResponse::message("Internal server error")
                    }
                }
                (_, ForwardError::Connection { .. } | ForwardError::Unknown { .. }) => {
                    ErrorResponse::message("Internal server error")
                }
            },
        };

        HttpResponse::build(status).json(body)
    }
}

/// Decodes JSON whatever the Content-Type; undecodable bodies are a 500.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .content_type_required(false)
        .content_type(|_| true)
        .error_handler(|err, _req| ProxyError::UnreadableJson(err.to_string()).into())
}

// RequestId extractor
impl FromRequest for RequestId {
    type Error = ProxyError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        let id = req
            .extensions()
            .get::<RequestId>()
            .cloned()
            .unwrap_or_else(|| RequestId(Uuid::new_v4().to_string()));
        ready(Ok(id))
    }
}

fn call_context(request_id: RequestId) -> CallContext {
    CallContext {
        request_id: Some(request_id.0),
    }
}

// Handlers

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
}

#[instrument]
pub async fn health_check() -> HttpResponse {
    info!("Health check requested");
    let response = HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    };
    HttpResponse::Ok().json(response)
}

#[instrument(skip(state, request_id, req), fields(request_id = %request_id.0))]
pub async fn login(
    state: web::Data<AppState>,
    request_id: RequestId,
    req: web::Json<LoginPayload>,
) -> Result<HttpResponse, ProxyError> {
    info!(email = %req.email, "Login attempt received");
    let reply = state
        .auth_service
        .login(&call_context(request_id), req.into_inner())
        .await
        .map_err(|e| ProxyError::from_domain(Flow::Login, e))?;
    Ok(HttpResponse::Ok().json(reply.body))
}

#[instrument(skip(state, request_id, req), fields(request_id = %request_id.0))]
pub async fn forgot_password(
    state: web::Data<AppState>,
    request_id: RequestId,
    req: web::Json<ForgotPasswordPayload>,
) -> Result<HttpResponse, ProxyError> {
    info!(email = %req.email, "Password reset requested");
    let reply = state
        .auth_service
        .forgot_password(&call_context(request_id), req.into_inner())
        .await
        .map_err(|e| ProxyError::from_domain(Flow::ForgotPassword, e))?;
    Ok(HttpResponse::Ok().json(reply.body))
}

#[instrument(skip(state, request_id, multipart), fields(request_id = %request_id.0))]
pub async fn register(
    state: web::Data<AppState>,
    request_id: RequestId,
    multipart: Multipart,
) -> Result<HttpResponse, ProxyError> {
    let payload = read_registration_form(multipart).await?;
    info!(
        email = %payload.email,
        has_file = payload.file.is_some(),
        "Buyer registration received"
    );
    let reply = state
        .auth_service
        .register(&call_context(request_id), payload)
        .await
        .map_err(|e| ProxyError::from_domain(Flow::Registration, e))?;
    Ok(HttpResponse::Created().json(reply.body))
}
