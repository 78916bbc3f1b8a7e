//! Error types for the platform client.

use thiserror::Error;

use crate::ErrorBody;

/// Errors that can occur when talking to the platform.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The request could not be sent or the response could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The platform answered with a non-success status.
    #[error("API error ({status}): {}", body.summary())]
    Api {
        /// HTTP status code of the response.
        status: u16,
        /// Parsed error body; `code` is empty when the body was not JSON.
        body: ErrorBody,
    },

    /// A success response did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl PlatformError {
    /// The error body, if the platform produced one.
    pub fn api_body(&self) -> Option<(u16, &ErrorBody)> {
        match self {
            PlatformError::Api { status, body } => Some((*status, body)),
            _ => None,
        }
    }

    /// Whether this error came from the transport rather than the platform.
    pub fn is_transport(&self) -> bool {
        matches!(self, PlatformError::Http(_))
    }

    /// Whether the platform reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        match self {
            PlatformError::Api { status, body } => {
                *status == 404
                    || body.code == "RESOURCE_NOT_FOUND"
                    || body.code == "ENTITY_NOT_FOUND"
                    || body.code == "RESOURCE_NOT_FOUND_EXCEPTION"
            }
            _ => false,
        }
    }
}
