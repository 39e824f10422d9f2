use crate::domain::validation::ValidationErrors;
use serde_json::Value;
use thiserror::Error;

/// Why a forwarded call did not produce a successful backend reply.
#[derive(Error, Debug)]
pub enum ForwardError {
    #[error("Backend responded with status {status}")]
    Backend { status: u16, body: Value },
    #[error("Backend unreachable ({code}): {message}")]
    Connection { code: String, message: String },
    #[error("Backend call failed ({name}): {message}")]
    Unknown {
        code: Option<String>,
        message: String,
        name: String,
    },
}

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(ValidationErrors),
    #[error(transparent)]
    Forward(#[from] ForwardError),
}
