//! Config file handling
//!
//! Settings are resolved in layers: built-in defaults, then
//! `config.toml` in the config directory, then environment variables.
//! CLI flags are applied on top of the result by the caller.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use super::env::{EnvVars, CONFIG_DIR_VAR, JOB_APP_ID_VAR, JOB_CREATE_URL_VAR, SINK_URL_VAR};
use crate::errors::{ChunkpostError, Result};
use crate::pipeline::{DEFAULT_CHUNK_SIZE, DEFAULT_INTER_CHUNK_DELAY};

/// Sink used when nothing else is configured
pub const DEFAULT_SINK_URL: &str = "http://localhost:3000/msg/notif";

pub const CONFIG_FILE_NAME: &str = "config.toml";

/// A duration written either as integer milliseconds or a humantime string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum DurationValue {
    Millis(u64),
    Text(String),
}

impl DurationValue {
    fn to_duration(&self, key: &str) -> Result<Duration> {
        match self {
            DurationValue::Millis(ms) => Ok(Duration::from_millis(*ms)),
            DurationValue::Text(s) => parse_duration(s)
                .map_err(|e| ChunkpostError::Config(format!("Invalid value for '{}': {}", key, e))),
        }
    }
}

/// Parse `"300ms"`, `"2s"`, `"1m 30s"`, or a bare number of milliseconds
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if let Ok(ms) = s.parse::<u64>() {
        return Ok(Duration::from_millis(ms));
    }
    humantime::parse_duration(s).map_err(|e| format!("'{}': {}", s, e))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    stream: StreamSection,
    serve: ServeSection,
    job: JobSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StreamSection {
    chunk_size: Option<usize>,
    delay: Option<DurationValue>,
    sink_url: Option<String>,
    timeout: Option<DurationValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ServeSection {
    host: Option<String>,
    port: Option<u16>,
    pid_file: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct JobSection {
    create_url: Option<String>,
    app_id: Option<String>,
    event: Option<String>,
}

/// Settings for `chunkpost stream`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSettings {
    pub chunk_size: usize,
    pub inter_chunk_delay: Duration,
    pub sink_url: String,
    pub timeout: Option<Duration>,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            inter_chunk_delay: DEFAULT_INTER_CHUNK_DELAY,
            sink_url: DEFAULT_SINK_URL.to_string(),
            timeout: None,
        }
    }
}

/// Settings for `chunkpost serve`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeSettings {
    pub host: String,
    pub port: u16,
    pub pid_file: PathBuf,
}

impl Default for ServeSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 2000,
            pid_file: PathBuf::from("pid.txt"),
        }
    }
}

/// Settings for `chunkpost create-job`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSettings {
    pub create_url: Option<String>,
    pub app_id: Option<String>,
    pub event: String,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            create_url: None,
            app_id: None,
            event: "print_doc.pdf".to_string(),
        }
    }
}

/// Resolved configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub config_dir: PathBuf,
    pub stream: StreamSettings,
    pub serve: ServeSettings,
    pub job: JobSettings,
}

impl Config {
    /// Resolve configuration from the config file and `env`.
    ///
    /// A missing config file is silently skipped. An unreadable or invalid
    /// one is reported and ignored, so the defaults plus environment apply.
    pub fn load(env: &EnvVars) -> Self {
        let config_dir = Self::config_dir(env);
        let path = config_dir.join(CONFIG_FILE_NAME);

        let mut config = Self {
            config_dir,
            ..Self::default()
        };

        if path.exists() {
            match Self::read_file(&path) {
                Ok(file) => {
                    debug!(path = %path.display(), "Loaded config file");
                    if let Err(e) = config.apply_file(file) {
                        warn!(path = %path.display(), error = %e, "Ignoring config file");
                        config = Self {
                            config_dir: config.config_dir,
                            ..Self::default()
                        };
                    }
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Ignoring config file"),
            }
        }

        config.apply_env(env);
        config
    }

    fn read_file(path: &Path) -> Result<FileConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ChunkpostError::Config(format!("Failed to read config: {}", e)))?;
        toml::from_str(&content)
            .map_err(|e| ChunkpostError::Config(format!("Invalid config TOML: {}", e)))
    }

    fn apply_file(&mut self, file: FileConfig) -> Result<()> {
        let FileConfig { stream, serve, job } = file;

        if let Some(chunk_size) = stream.chunk_size {
            self.stream.chunk_size = chunk_size;
        }
        if let Some(delay) = stream.delay {
            self.stream.inter_chunk_delay = delay.to_duration("stream.delay")?;
        }
        if let Some(url) = stream.sink_url {
            self.stream.sink_url = url;
        }
        if let Some(timeout) = stream.timeout {
            self.stream.timeout = Some(timeout.to_duration("stream.timeout")?);
        }

        if let Some(host) = serve.host {
            self.serve.host = host;
        }
        if let Some(port) = serve.port {
            self.serve.port = port;
        }
        if let Some(pid_file) = serve.pid_file {
            self.serve.pid_file = pid_file;
        }

        if job.create_url.is_some() {
            self.job.create_url = job.create_url;
        }
        if job.app_id.is_some() {
            self.job.app_id = job.app_id;
        }
        if let Some(event) = job.event {
            self.job.event = event;
        }

        Ok(())
    }

    fn apply_env(&mut self, env: &EnvVars) {
        if let Some(url) = env.get_non_empty(SINK_URL_VAR) {
            self.stream.sink_url = url.to_string();
        }
        if let Some(url) = env.get_non_empty(JOB_CREATE_URL_VAR) {
            self.job.create_url = Some(url.to_string());
        }
        if let Some(app_id) = env.get_non_empty(JOB_APP_ID_VAR) {
            self.job.app_id = Some(app_id.to_string());
        }
    }

    /// `$CHUNKPOST_CONFIG_DIR`, else the platform config dir
    fn config_dir(env: &EnvVars) -> PathBuf {
        if let Some(dir) = env.get_non_empty(CONFIG_DIR_VAR) {
            return PathBuf::from(dir);
        }
        dirs::config_dir()
            .map(|p| p.join("chunkpost"))
            .unwrap_or_else(|| PathBuf::from(".chunkpost"))
    }
}
