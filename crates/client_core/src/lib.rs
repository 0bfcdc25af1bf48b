use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    error::ApiException,
    protocol::{HistoryEntry, HistoryRecords, SaveConfigResponse, StopResponse, SyncConfig},
};
use tracing::{debug, info, warn};
use url::Url;

pub mod config_form;
pub mod controller;
pub mod error;
pub mod history;
pub mod log;
pub mod session;
pub mod sse;

pub use controller::SessionController;
pub use error::ClientError;
pub use sse::{SseEvent, SseEventStream};

const RUN_PATH: &str = "/api/run";
const STOP_PATH: &str = "/api/stop";
const CONFIG_PATH: &str = "/api/config";
const HISTORY_PATH: &str = "/api/history";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Operations the sync service exposes. The controller and the CLI only talk
/// to the service through this trait.
#[async_trait]
pub trait SyncApi: Send + Sync + 'static {
    /// Opens the live log stream of a new sync run.
    async fn open_run_stream(&self) -> Result<SseEventStream, ClientError>;
    async fn stop(&self) -> Result<StopResponse, ClientError>;
    async fn fetch_config(&self) -> Result<SyncConfig, ClientError>;
    async fn save_config(&self, config: &SyncConfig) -> Result<(), ClientError>;
    async fn fetch_history(&self) -> Result<Vec<HistoryEntry>, ClientError>;
}

#[derive(Debug, Clone)]
pub struct SyncClient {
    http: Client,
    base_url: String,
    request_timeout: Duration,
}

impl SyncClient {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        let parsed = Url::parse(server_url).map_err(|err| ClientError::InvalidServerUrl {
            url: server_url.to_string(),
            reason: err.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidServerUrl {
                url: server_url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        Ok(Self {
            http: Client::new(),
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Decodes a reply body. Error statuses still yield the body when it has the
/// expected shape, so the service's own message reaches the caller.
async fn read_reply<T: DeserializeOwned>(
    response: Response,
    endpoint: &'static str,
) -> Result<T, ClientError> {
    let status_error = response.error_for_status_ref().err();
    let Some(status_error) = status_error else {
        return response.json().await.map_err(ClientError::request(endpoint));
    };
    let status = response.status();
    let body = response.bytes().await.map_err(ClientError::request(endpoint))?;
    match serde_json::from_slice(&body) {
        Ok(reply) => {
            warn!(endpoint, %status, "service replied with an error status");
            Ok(reply)
        }
        Err(_) => Err(ClientError::request(endpoint)(status_error)),
    }
}

#[async_trait]
impl SyncApi for SyncClient {
    async fn open_run_stream(&self) -> Result<SseEventStream, ClientError> {
        let response = self
            .http
            .get(self.endpoint(RUN_PATH))
            .header(header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(ClientError::request(RUN_PATH))?
            .error_for_status()
            .map_err(ClientError::request(RUN_PATH))?;

        let is_event_stream = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("text/event-stream"));
        if !is_event_stream {
            warn!(endpoint = RUN_PATH, "run endpoint did not declare an event stream");
        }

        info!(server = %self.base_url, "sync: run stream opened");
        Ok(sse::decode_stream(response.bytes_stream()))
    }

    async fn stop(&self) -> Result<StopResponse, ClientError> {
        let response = self
            .http
            .post(self.endpoint(STOP_PATH))
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(ClientError::request(STOP_PATH))?;
        let response: StopResponse = read_reply(response, STOP_PATH).await?;
        info!(status = ?response.status, "sync: stop acknowledged");
        Ok(response)
    }

    async fn fetch_config(&self) -> Result<SyncConfig, ClientError> {
        let config: SyncConfig = self
            .http
            .get(self.endpoint(CONFIG_PATH))
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(ClientError::request(CONFIG_PATH))?
            .error_for_status()
            .map_err(ClientError::request(CONFIG_PATH))?
            .json()
            .await
            .map_err(ClientError::request(CONFIG_PATH))?;
        debug!(playlists = config.playlists.len(), "config: fetched");
        Ok(config)
    }

    async fn save_config(&self, config: &SyncConfig) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.endpoint(CONFIG_PATH))
            .timeout(self.request_timeout)
            .json(config)
            .send()
            .await
            .map_err(ClientError::request(CONFIG_PATH))?;
        let response: SaveConfigResponse = read_reply(response, CONFIG_PATH).await?;

        match response {
            SaveConfigResponse::Success => {
                info!(playlists = config.playlists.len(), "config: saved");
                Ok(())
            }
            SaveConfigResponse::Error(err) => {
                warn!(error = %err.error, "config: save rejected");
                Err(ApiException::from(err).into())
            }
        }
    }

    async fn fetch_history(&self) -> Result<Vec<HistoryEntry>, ClientError> {
        let records: HistoryRecords = self
            .http
            .get(self.endpoint(HISTORY_PATH))
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(ClientError::request(HISTORY_PATH))?
            .error_for_status()
            .map_err(ClientError::request(HISTORY_PATH))?
            .json()
            .await
            .map_err(ClientError::request(HISTORY_PATH))?;
        debug!(entries = records.0.len(), "history: fetched");
        Ok(records.into_entries())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
