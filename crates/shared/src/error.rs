use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by `POST /api/config` when the service refuses a save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Debug, Error)]
#[error("service rejected request: {message}")]
pub struct ApiException {
    pub message: String,
}

impl ApiException {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<ApiError> for ApiException {
    fn from(value: ApiError) -> Self {
        Self {
            message: value.error,
        }
    }
}
