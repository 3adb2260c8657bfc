//! HTTP client for the relay's session endpoints.
//!
//! One `reqwest::Client` is built at start-up and reused for every request,
//! so both loops share its connection pool.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use deskrelay_core::relay::{session_path, ControlsBody};
use deskrelay_core::ControlSnapshot;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;

use crate::application::host_loop::RelayApi;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum RelayClientError {
    #[error("relay URL {url:?} must start with http:// or https://")]
    InvalidUrl { url: String },

    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("invalid response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Talks to one session on one relay.
#[derive(Debug, Clone)]
pub struct RelayClient {
    client: reqwest::Client,
    base_url: String,
    session_id: String,
}

impl RelayClient {
    /// `base_url` is e.g. `http://relay.example:8080`; a trailing `/` is
    /// ignored.
    pub fn new(base_url: &str, session_id: impl Into<String>) -> Result<Self, RelayClientError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(RelayClientError::InvalidUrl {
                url: base_url.to_owned(),
            });
        }
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(RelayClientError::Build)?;
        Ok(Self {
            client,
            base_url: base_url.to_owned(),
            session_id: session_id.into(),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Absolute URL of one of this session's endpoints.
    pub fn endpoint(&self, name: &str) -> String {
        format!("{}{}", self.base_url, session_path(&self.session_id, name))
    }

    /// URL of the live frame stream a viewer renders for this session.
    pub fn stream_url(&self) -> String {
        self.endpoint("stream")
    }

    fn check_status(url: &str, response: &reqwest::Response) -> Result<(), RelayClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(RelayClientError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
            })
        }
    }
}

#[async_trait]
impl RelayApi for RelayClient {
    async fn post_image(&self, image: Bytes) -> Result<(), RelayClientError> {
        let url = self.endpoint("image");
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(image)
            .send()
            .await
            .map_err(|source| RelayClientError::Request {
                url: url.clone(),
                source,
            })?;
        Self::check_status(&url, &response)
    }

    async fn fetch_controls(&self, since: Option<u64>) -> Result<Vec<ControlSnapshot>, RelayClientError> {
        let url = self.endpoint("controls");
        let mut request = self.client.get(&url);
        if let Some(since) = since {
            request = request.query(&[("since", since)]);
        }
        let response = request.send().await.map_err(|source| RelayClientError::Request {
            url: url.clone(),
            source,
        })?;
        Self::check_status(&url, &response)?;
        let body: ControlsBody = response
            .json()
            .await
            .map_err(|source| RelayClientError::Decode { url, source })?;
        Ok(body.controls)
    }
}
