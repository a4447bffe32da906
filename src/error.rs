use crate::response::{ApiErrorBody, ResponseFormat};
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for VK API operations
#[derive(Debug, Error)]
pub enum VkError {
    /// A parameter value that has no scalar string form
    #[error("invalid type for parameter {key:?}: {kind}")]
    InvalidParameterType { key: String, kind: &'static str },

    /// Upload source could not be opened or read
    #[error("cannot read upload file {}: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Request building error (URL or multipart body)
    #[error("failed to encode request: {0}")]
    Encoding(String),

    /// HTTP client error
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status with a body that could not be decoded
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    /// Response body is not valid for the selected format
    #[error("failed to decode {format} response: {message}")]
    Decode {
        format: ResponseFormat,
        message: String,
    },

    /// OAuth endpoint returned an error envelope
    #[error("authorization failed: {error}: {description}")]
    Auth { error: String, description: String },

    /// API method returned an error envelope
    #[error("VK API error {code}: {message}")]
    Api {
        code: i64,
        message: String,
        response: ApiErrorBody,
    },
}

impl VkError {
    /// Create a new API error from a decoded error envelope
    pub fn from_api_error(response: ApiErrorBody) -> Self {
        VkError::Api {
            code: response.error_code,
            message: response.error_msg.clone(),
            response,
        }
    }

    pub(crate) fn decode(format: ResponseFormat, err: impl std::fmt::Display) -> Self {
        VkError::Decode {
            format,
            message: err.to_string(),
        }
    }

    /// Check if this error came from the OAuth endpoint
    pub fn is_auth_error(&self) -> bool {
        matches!(self, VkError::Auth { .. })
    }

    /// Check if this error is an API method error envelope
    pub fn is_api_error(&self) -> bool {
        matches!(self, VkError::Api { .. })
    }

    /// Get the VK error code if this is an API error
    pub fn api_code(&self) -> Option<i64> {
        match self {
            VkError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Result type for VK API operations
pub type Result<T> = std::result::Result<T, VkError>;
