use crate::domain::backend::{BackendReply, BuyerBackend, CallContext};
use crate::domain::error::ForwardError;
use crate::domain::forms::{ForgotPasswordPayload, LoginPayload, RegistrationPayload};
use crate::infrastructure::config::FlowTimeouts;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::error::Error as StdError;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Buyer backend reached over HTTP with `reqwest`.
#[derive(Clone)]
pub struct HttpBuyerBackend {
    client: Client,
    base_url: String,
    timeouts: FlowTimeouts,
}

impl HttpBuyerBackend {
    pub fn new(base_url: &str, timeouts: FlowTimeouts) -> Result<Self, reqwest::Error> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, base_url, timeouts))
    }

    pub fn with_client(client: Client, base_url: &str, timeouts: FlowTimeouts) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeouts,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn post(&self, ctx: &CallContext, path: &str, timeout: Duration) -> RequestBuilder {
        let request = self.client.post(self.url(path)).timeout(timeout);
        match &ctx.request_id {
            Some(id) => request.header(REQUEST_ID_HEADER, id),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<BackendReply, ForwardError> {
        let response = request.send().await.map_err(classify)?;
        let status = response.status();
        let raw = response.bytes().await.map_err(classify)?;
        let body = parse_body(&raw);
        debug!(status = status.as_u16(), "Backend responded");

        if status.is_success() {
            Ok(BackendReply {
                status: status.as_u16(),
                body,
            })
        } else {
            Err(ForwardError::Backend {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl BuyerBackend for HttpBuyerBackend {
    #[instrument(skip(self, ctx, payload), fields(email = %payload.email))]
    async fn login(
        &self,
        ctx: &CallContext,
        payload: LoginPayload,
    ) -> Result<BackendReply, ForwardError> {
        let request = self
            .post(ctx, "/login", self.timeouts.login)
            .json(&payload);
        self.send(request).await
    }

    #[instrument(skip(self, ctx, payload), fields(email = %payload.email))]
    async fn forgot_password(
        &self,
        ctx: &CallContext,
        payload: ForgotPasswordPayload,
    ) -> Result<BackendReply, ForwardError> {
        let request = self
            .post(ctx, "/forgot-password", self.timeouts.forgot_password)
            .json(&payload);
        self.send(request).await
    }

    #[instrument(skip(self, ctx, payload), fields(email = %payload.email))]
    async fn create_buyer(
        &self,
        ctx: &CallContext,
        payload: RegistrationPayload,
    ) -> Result<BackendReply, ForwardError> {
        let form = registration_form(payload)?;
        let request = self
            .post(ctx, "/create", self.timeouts.registration)
            .multipart(form);
        self.send(request).await
    }
}

fn registration_form(payload: RegistrationPayload) -> Result<Form, ForwardError> {
    let mut form = Form::new()
        .text("fullName", payload.name)
        .text("email", payload.email)
        .text("password", payload.password)
        .text("confirmPassword", payload.confirm_password)
        .text("phone", payload.phone);

    if let Some(file) = payload.file {
        debug!(
            file_name = %file.file_name,
            size = file.size(),
            "Attaching uploaded file"
        );
        let mut part = Part::bytes(file.bytes.to_vec()).file_name(file.file_name);
        if let Some(content_type) = file.content_type {
            part = part.mime_str(&content_type).map_err(|e| ForwardError::Unknown {
                code: None,
                message: e.to_string(),
                name: "EncodingError".to_string(),
            })?;
        }
        form = form.part("file", part);
    }

    Ok(form)
}

/// JSON when possible, otherwise the raw text as a JSON string.
fn parse_body(raw: &[u8]) -> Value {
    serde_json::from_slice(raw)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(raw).into_owned()))
}

fn classify(err: reqwest::Error) -> ForwardError {
    let message = error_chain(&err);

    if err.is_timeout() {
        warn!(error = %message, "Backend call timed out");
        return ForwardError::Unknown {
            code: Some("ETIMEDOUT".to_string()),
            message,
            name: "TimeoutError".to_string(),
        };
    }

    if err.is_connect() {
        return connect_failure(connect_code(&err), message);
    }

    let name = if err.is_body() || err.is_decode() {
        "BodyError"
    } else if err.is_builder() {
        "BuilderError"
    } else if err.is_request() {
        "RequestError"
    } else {
        "Error"
    };
    warn!(name = name, error = %message, "Backend call failed");
    ForwardError::Unknown {
        code: io_kind(&err).map(|kind| format!("{kind:?}")),
        message,
        name: name.to_string(),
    }
}

/// Only a refused connection or a failed lookup means the backend is unreachable.
fn connect_failure(code: String, message: String) -> ForwardError {
    match code.as_str() {
        "ECONNREFUSED" | "ENOTFOUND" => {
            warn!(code = %code, error = %message, "Backend unreachable");
            ForwardError::Connection { code, message }
        }
        _ => {
            warn!(code = %code, error = %message, "Backend connection failed");
            ForwardError::Unknown {
                code: Some(code),
                message,
                name: "ConnectError".to_string(),
            }
        }
    }
}

fn connect_code(err: &reqwest::Error) -> String {
    match io_kind(err) {
        Some(std::io::ErrorKind::ConnectionRefused) => "ECONNREFUSED".to_string(),
        Some(std::io::ErrorKind::ConnectionReset) => "ECONNRESET".to_string(),
        Some(std::io::ErrorKind::TimedOut) => "ETIMEDOUT".to_string(),
        _ if error_chain(err).contains("dns error") => "ENOTFOUND".to_string(),
        Some(kind) => format!("{kind:?}"),
        None => "ECONNECT".to_string(),
    }
}

fn io_kind(err: &reqwest::Error) -> Option<std::io::ErrorKind> {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            return Some(io.kind());
        }
        source = cause.source();
    }
    None
}

fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
