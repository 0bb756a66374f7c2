//! HTTP sink: POSTs each chunk as `{"msg": "..."}`

use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use url::Url;

use super::{DeliveryOutcome, Sink};
use crate::errors::{ChunkpostError, Result};
use crate::pipeline::Chunk;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON body sent for every chunk
#[derive(Debug, Serialize)]
struct MessagePayload<'a> {
    msg: &'a str,
}

/// Sink that posts chunks to an HTTP endpoint
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: Client,
    url: Url,
}

impl HttpSink {
    /// Create a sink posting to `url`, with an optional request timeout.
    pub fn new(url: Url, timeout: Option<Duration>) -> Result<Self> {
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ChunkpostError::Config(format!(
                    "Sink URL must use http or https, got '{}'",
                    other
                )))
            }
        }

        let client = build_client(timeout.unwrap_or(DEFAULT_TIMEOUT))?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl Sink for HttpSink {
    async fn deliver(&self, chunk: Chunk) -> DeliveryOutcome {
        let payload = MessagePayload { msg: chunk.text() };

        let response = match self.client.post(self.url.clone()).json(&payload).send().await {
            Ok(response) => response,
            Err(e) => return DeliveryOutcome::failed(describe_error(&e)),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return DeliveryOutcome::failed(describe_error(&e)),
        };

        if status.is_success() {
            DeliveryOutcome::Delivered {
                status_code: status.as_u16(),
                body,
            }
        } else {
            DeliveryOutcome::failed(format!("HTTP {}: {}", status, body))
        }
    }
}

fn describe_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Timeout".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        e.to_string()
    }
}

fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(concat!("chunkpost/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .map_err(|e| ChunkpostError::Config(format!("Failed to build HTTP client: {}", e)))
}
