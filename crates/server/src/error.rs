//! API error types.

use crate::engine::RenderError;
use crate::registry::RegistryError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    InvalidSize(String),

    #[error("storage error: {0}")]
    Storage(#[from] skinvault_storage::StorageError),

    #[error("metadata error: {0}")]
    Metadata(#[from] skinvault_metadata::MetadataError),

    #[error("core error: {0}")]
    Core(#[from] skinvault_core::Error),
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Internal(_) => "internal_error",
            Self::InvalidSize(_) => "invalid_size",
            Self::Storage(_) => "storage_error",
            Self::Metadata(_) => "metadata_error",
            Self::Core(e) => match e {
                skinvault_core::Error::InvalidIdentity(_) => "invalid_identity",
                skinvault_core::Error::InvalidSize { .. } => "invalid_size",
                skinvault_core::Error::Decode(_) => "invalid_texture",
                skinvault_core::Error::DimensionMismatch { .. } => "invalid_dimensions",
                _ => "core_error",
            },
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidSize(_) => StatusCode::BAD_REQUEST,
            Self::Storage(e) => match e {
                skinvault_storage::StorageError::NotFound(_) => StatusCode::NOT_FOUND,
                skinvault_storage::StorageError::InvalidKey(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Metadata(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Core(e) => match e {
                skinvault_core::Error::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_REQUEST,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::SlotEmpty { .. } | RegistryError::UnknownIdentity(_) => {
                Self::NotFound(e.to_string())
            }
            RegistryError::Storage(e) => Self::Storage(e),
            RegistryError::Metadata(e) => Self::Metadata(e),
        }
    }
}

impl From<RenderError> for ApiError {
    fn from(e: RenderError) -> Self {
        match e {
            RenderError::InvalidSize { .. } => Self::InvalidSize(e.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
