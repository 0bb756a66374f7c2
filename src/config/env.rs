//! Environment variables, optionally seeded from a `.env` file
//!
//! Values from the process environment always win over values from the
//! file, so a `.env` file can only supply defaults.

use std::collections::HashMap;
use std::path::Path;

use crate::errors::{ChunkpostError, Result};

/// Overrides the sink URL
pub const SINK_URL_VAR: &str = "JOB_ITEM_MSG_NOTIF_HOST";
/// Job creation endpoint
pub const JOB_CREATE_URL_VAR: &str = "JOB_ITEM_CREATE_URL";
/// Application id sent with job creation requests
pub const JOB_APP_ID_VAR: &str = "JOB_ITEM_APP_ID";
/// Overrides the config directory
pub const CONFIG_DIR_VAR: &str = "CHUNKPOST_CONFIG_DIR";

/// Snapshot of environment variables
#[derive(Debug, Clone, Default)]
pub struct EnvVars {
    vars: HashMap<String, String>,
}

impl EnvVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `path` (or `./.env` when `path` is `None` and the file exists),
    /// then layer the process environment on top.
    ///
    /// An explicit path that cannot be read is an error; a missing default
    /// `.env` is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut env = match path {
            Some(path) => Self::read_file(path)?,
            None => {
                let default = Path::new(".env");
                if default.is_file() {
                    Self::read_file(default)?
                } else {
                    Self::new()
                }
            }
        };
        env.vars.extend(std::env::vars());
        Ok(env)
    }

    fn read_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ChunkpostError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parse `.env` content: `KEY=value` lines, blank lines and `#` comments.
    pub fn parse(content: &str) -> Result<Self> {
        let mut vars = HashMap::new();

        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (key, value) = parse_line(line).ok_or_else(|| {
                ChunkpostError::Config(format!("Invalid .env syntax at line {}: {}", idx + 1, line))
            })?;
            vars.insert(key, value);
        }

        Ok(Self { vars })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Like [`get`](Self::get), but treats an empty value as unset
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }
}

fn parse_line(line: &str) -> Option<(String, String)> {
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, rest) = line.split_once('=')?;
    let key = key.trim();

    let valid_key = !key.is_empty()
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !key.starts_with(|c: char| c.is_ascii_digit());
    if !valid_key {
        return None;
    }

    let rest = rest.trim();
    let value = if let Some(inner) = strip_quotes(rest, '"') {
        unescape(inner)
    } else if let Some(inner) = strip_quotes(rest, '\'') {
        inner.to_string()
    } else {
        match rest.find(" #") {
            Some(pos) => rest[..pos].trim_end().to_string(),
            None => rest.to_string(),
        }
    };

    Some((key.to_string(), value))
}

fn strip_quotes(s: &str, quote: char) -> Option<&str> {
    s.strip_prefix(quote)?.strip_suffix(quote)
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
