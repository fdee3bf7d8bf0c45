//! Ingress errors
//!
//! Input errors answer 400 with a static message. Store errors answer a
//! generic 500; their cause goes to the log only.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use super::Envelope;
use crate::images::{FileNameError, ImageError};

/// Message returned for every store failure
pub const GENERIC_FAILURE: &str = "Error processing request";

/// Errors surfaced by the `/img` ingress
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid input data.")]
    InvalidInput,

    #[error("Invalid action specified.")]
    InvalidAction,

    #[error("Invalid file name.")]
    InvalidFileName(FileNameError),

    #[error(transparent)]
    Image(#[from] ImageError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput | ApiError::InvalidAction | ApiError::InvalidFileName(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Image(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand to the caller
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Image(_) => GENERIC_FAILURE.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<FileNameError> for ApiError {
    fn from(e: FileNameError) -> Self {
        ApiError::InvalidFileName(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Image(e) => {
                let cause = std::error::Error::source(e)
                    .map(|s| s.to_string())
                    .unwrap_or_default();
                tracing::error!(error = %e, cause = %cause, "Error processing request");
            }
            ApiError::InvalidFileName(reason) => {
                tracing::warn!("Rejected upload: {}", reason);
            }
            _ => tracing::debug!("Rejected request: {}", self),
        }

        Envelope::message(self.status(), self.public_message()).into_response()
    }
}
