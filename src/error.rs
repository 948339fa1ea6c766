//! The error module maps every failure a request can run into onto an HTTP response.

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;
use serde::Serialize;
use thiserror::Error;

/// Failures surfaced by the improve endpoint.
#[derive(Debug, Error)]
pub enum ImproveError {
    /// The uploaded file did not declare `text/html`.
    #[error("Only HTML files are supported.")]
    UnsupportedMediaType { content_type: Option<String> },

    /// A required multipart field was not sent.
    #[error("Field required: {0}")]
    MissingField(&'static str),

    /// The multipart body could not be read.
    #[error("{}", .0.body_text())]
    Multipart(#[from] MultipartError),

    /// The model process ran but exited unsuccessfully.
    #[error("Error querying {model}: {stderr}")]
    ModelFailed { model: String, stderr: String },

    /// The model process could not be started at all.
    #[error("Unable to run {program}: {source}")]
    ModelUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The remote table rejected the record or could not be reached.
    #[error("Failed to store record: {reason}")]
    Persistence { reason: String },
}

impl ImproveError {
    /// Returns the HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnsupportedMediaType { .. } => StatusCode::BAD_REQUEST,
            Self::MissingField(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Multipart(err) => err.status(),
            Self::ModelFailed { .. } | Self::ModelUnavailable { .. } | Self::Persistence { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<reqwest::Error> for ImproveError {
    fn from(err: reqwest::Error) -> Self {
        Self::Persistence {
            reason: err.to_string(),
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl IntoResponse for ImproveError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{self}");
        }

        let detail = match self {
            Self::Persistence { .. } => "Internal Server Error".to_owned(),
            other => other.to_string(),
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}
