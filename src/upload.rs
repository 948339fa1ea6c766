//! The upload module pulls the uploaded HTML file out of a multipart request.

use axum::body::Bytes;
use axum::extract::Multipart;
use log::debug;

use crate::constants::{HTML_MIME, UPLOAD_FIELD};
use crate::error::ImproveError;

/// A file received in one request. It is dropped with the request.
#[derive(Debug)]
pub struct UploadedFile {
    /// File name sent by the client, if any.
    pub file_name: Option<String>,
    /// Whole file content.
    pub content: Bytes,
}

/// Returns `true` if `content_type` is exactly the HTML MIME type.
pub fn is_html(content_type: Option<&str>) -> bool {
    content_type == Some(HTML_MIME)
}

/// Reads the `file` field of `multipart` into memory.
///
/// Other fields are skipped. The declared content type is checked before the
/// body is read.
///
/// # Errors
///
/// Returns an error if:
/// * The multipart body is malformed
/// * No `file` field is present
/// * The field is not declared as `text/html`
pub async fn read_upload(multipart: &mut Multipart) -> Result<UploadedFile, ImproveError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        if !is_html(content_type.as_deref()) {
            return Err(ImproveError::UnsupportedMediaType { content_type });
        }

        let content = field.bytes().await?;
        debug!(
            "Received {} ({} bytes)",
            file_name.as_deref().unwrap_or("unnamed file"),
            content.len()
        );

        return Ok(UploadedFile { file_name, content });
    }

    Err(ImproveError::MissingField(UPLOAD_FIELD))
}
