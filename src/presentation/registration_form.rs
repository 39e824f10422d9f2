use crate::domain::forms::{RegistrationPayload, UploadedFile};
use actix_multipart::{Field, Multipart, MultipartError};
use bytes::BytesMut;
use futures_util::TryStreamExt;
use thiserror::Error;
use tracing::{debug, trace};

/// Hard cap on what is buffered for one uploaded file.
pub const MAX_BUFFERED_FILE_BYTES: usize = 20 * 1024 * 1024;
/// Cap for each text field.
pub const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

#[derive(Error, Debug)]
pub enum RegistrationFormError {
    #[error("Malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),
    #[error("Field '{0}' is not valid UTF-8")]
    InvalidText(String),
    #[error("Field '{field}' exceeds {limit} bytes")]
    TooLarge { field: String, limit: usize },
}

/// Reads a browser registration submission into a payload.
///
/// The client sends the buyer's name as `fullName`; `name` is accepted too.
/// An empty file part without a filename counts as no file.
pub async fn read_registration_form(
    mut multipart: Multipart,
) -> Result<RegistrationPayload, RegistrationFormError> {
    let mut payload = RegistrationPayload::default();

    while let Some(mut field) = multipart.try_next().await? {
        let (name, file_name) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().unwrap_or_default().to_string(),
                cd.get_filename().map(str::to_string),
            ),
            None => (String::new(), None),
        };

        match name.as_str() {
            "fullName" | "name" => payload.name = read_text(&mut field, &name).await?,
            "email" => payload.email = read_text(&mut field, &name).await?,
            "password" => payload.password = read_text(&mut field, &name).await?,
            "confirmPassword" => payload.confirm_password = read_text(&mut field, &name).await?,
            "phone" => payload.phone = read_text(&mut field, &name).await?,
            "file" => {
                let content_type = field.content_type().map(|mime| mime.essence_str().to_string());
                let bytes = read_bytes(&mut field, &name, MAX_BUFFERED_FILE_BYTES).await?;
                let file_name = file_name.unwrap_or_default();
                if file_name.is_empty() && bytes.is_empty() {
                    trace!("Empty file part ignored");
                    continue;
                }
                debug!(
                    file_name = %file_name,
                    size = bytes.len(),
                    content_type = ?content_type,
                    "Received uploaded file"
                );
                payload.file = Some(UploadedFile {
                    file_name,
                    content_type,
                    bytes: bytes.freeze(),
                });
            }
            other => {
                trace!(field = other, "Skipping unknown form field");
                while field.try_next().await?.is_some() {}
            }
        }
    }

    Ok(payload)
}

async fn read_text(field: &mut Field, name: &str) -> Result<String, RegistrationFormError> {
    let bytes = read_bytes(field, name, MAX_TEXT_FIELD_BYTES).await?;
    String::from_utf8(bytes.to_vec()).map_err(|_| RegistrationFormError::InvalidText(name.to_string()))
}

async fn read_bytes(
    field: &mut Field,
    name: &str,
    limit: usize,
) -> Result<BytesMut, RegistrationFormError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field.try_next().await? {
        if buf.len() + chunk.len() > limit {
            return Err(RegistrationFormError::TooLarge {
                field: name.to_string(),
                limit,
            });
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}
