use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error as ThisError;
use utoipa::ToSchema;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid request data, e.g. a missing multipart field or an unparseable flag
    #[error("{message}")]
    BadRequest { message: String },

    /// Uploaded document exceeds the configured size limit
    #[error("{message}")]
    PayloadTooLarge { message: String },

    /// Uploaded document has an extension outside the allowed formats
    #[error("Unsupported file format '{extension}'. Allowed formats: {allowed}")]
    UnsupportedMediaType { extension: String, allowed: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Filesystem failure while storing or reading documents
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Body returned for every failed request, mirroring the per-document failure shape used in
/// batch results.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Always `false`
    pub success: bool,
    /// Human readable description of what went wrong
    pub error: String,
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Internal { .. } | Error::Io(_) | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { message } | Error::PayloadTooLarge { message } => message.clone(),
            Error::UnsupportedMediaType { .. } | Error::NotFound { .. } => self.to_string(),
            Error::Internal { .. } | Error::Other(_) => "Internal server error".to_string(),
            Error::Io(_) => "Failed to store document".to_string(),
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            success: false,
            error: self.user_message(),
        }
    }

    /// Log the error at a level matching its severity
    pub fn log(&self) {
        match self {
            Error::Internal { .. } | Error::Io(_) | Error::Other(_) => {
                tracing::error!("Error processing document: {:#}", self);
            }
            Error::PayloadTooLarge { .. } | Error::UnsupportedMediaType { .. } => {
                tracing::warn!("Rejected document: {}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        self.log();
        (self.status_code(), axum::Json(self.body())).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
