use shared::error::ApiException;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid server url '{url}': {reason}")]
    InvalidServerUrl { url: String, reason: String },
    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("event stream transport failed: {0}")]
    Transport(String),
    #[error(transparent)]
    Rejected(#[from] ApiException),
}

impl ClientError {
    pub(crate) fn request(endpoint: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Self::Request { endpoint, source }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.to_string())
    }
}
