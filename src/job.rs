//! One-shot job creation request

use reqwest::Client;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::errors::{ChunkpostError, Result};

/// Body of a job creation request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRequest {
    pub app_id: Option<String>,
    pub event: String,
    pub form_body: Map<String, Value>,
}

impl JobRequest {
    /// Build a request. An empty `form` becomes `{"key": "value"}`.
    pub fn new(app_id: Option<String>, event: impl Into<String>, form: Vec<(String, String)>) -> Self {
        let form_body = if form.is_empty() {
            let mut map = Map::new();
            map.insert("key".to_string(), Value::String("value".to_string()));
            map
        } else {
            form.into_iter().map(|(k, v)| (k, Value::String(v))).collect()
        };

        if app_id.is_none() {
            warn!("No app id configured; sending job request with a null app_id");
        }

        Self {
            app_id,
            event: event.into(),
            form_body,
        }
    }
}

/// Parse a `KEY=VALUE` form field
pub fn parse_form_field(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

/// POST `request` to `url`, optionally after waiting `after`.
///
/// Returns the decoded JSON response on 2xx. A 2xx response whose body is
/// not JSON is returned as a JSON string.
pub async fn create_job(
    url: &Url,
    request: &JobRequest,
    after: Option<Duration>,
    timeout: Option<Duration>,
) -> Result<Value> {
    if let Some(delay) = after {
        info!(delay = %humantime::format_duration(delay), "Waiting before job request");
        tokio::time::sleep(delay).await;
    }

    let mut builder = Client::builder().user_agent(concat!("chunkpost/", env!("CARGO_PKG_VERSION")));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    let client = builder
        .build()
        .map_err(|e| ChunkpostError::Config(format!("Failed to build HTTP client: {}", e)))?;

    info!(url = %url, event = %request.event, "Sending job request");
    let response = client.post(url.clone()).json(request).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ChunkpostError::Job(format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        ).trim_end().to_string()));
    }

    let text = response.text().await?;
    let value = serde_json::from_str(&text).unwrap_or(Value::String(text));
    info!(response = %value, "Job created");
    Ok(value)
}
