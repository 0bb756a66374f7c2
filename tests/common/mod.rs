//! Common test utilities for chunkpost integration tests
//!
//! - In-memory sinks that record what they were given
//! - Readers that fail on demand
//! - CLI invocation helpers
//! - Temporary file fixtures

#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::{Command, Output, Stdio};
use std::sync::Mutex;
use std::task::{Context, Poll};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncRead, ReadBuf};

use chunkpost::pipeline::Chunk;
use chunkpost::sink::{DeliveryOutcome, Sink};

/// The worked example: 34 bytes, four chunks at chunk size 10
pub const HELLO_TEXT: &str = "Hello, World! This is a test file.";

// ============================================================================
// Sinks
// ============================================================================

/// Records every chunk and reports success
#[derive(Default)]
pub struct RecordingSink {
    chunks: Mutex<Vec<Chunk>>,
}

impl RecordingSink {
    /// Recorded chunks in read order (deliveries may complete out of order)
    pub fn chunks(&self) -> Vec<Chunk> {
        let mut chunks = self.chunks.lock().unwrap().clone();
        chunks.sort_by_key(|c| c.index());
        chunks
    }

    pub fn texts(&self) -> Vec<String> {
        self.chunks().into_iter().map(Chunk::into_text).collect()
    }
}

impl Sink for RecordingSink {
    async fn deliver(&self, chunk: Chunk) -> DeliveryOutcome {
        self.chunks.lock().unwrap().push(chunk);
        DeliveryOutcome::Delivered {
            status_code: 200,
            body: "ok".to_string(),
        }
    }
}

/// Records every chunk and reports a transport error for each
#[derive(Default)]
pub struct FailingSink {
    inner: RecordingSink,
}

impl FailingSink {
    pub fn chunks(&self) -> Vec<Chunk> {
        self.inner.chunks()
    }
}

impl Sink for FailingSink {
    async fn deliver(&self, chunk: Chunk) -> DeliveryOutcome {
        self.inner.chunks.lock().unwrap().push(chunk);
        DeliveryOutcome::failed("Connection failed: connection refused")
    }
}

/// Takes `latency` to accept each chunk
pub struct SlowSink {
    pub latency: Duration,
    inner: RecordingSink,
}

impl SlowSink {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            inner: RecordingSink::default(),
        }
    }

    pub fn chunks(&self) -> Vec<Chunk> {
        self.inner.chunks()
    }
}

impl Sink for SlowSink {
    async fn deliver(&self, chunk: Chunk) -> DeliveryOutcome {
        tokio::time::sleep(self.latency).await;
        self.inner.deliver(chunk).await
    }
}

// ============================================================================
// Readers
// ============================================================================

/// Serves `data` up to `fail_at`, then returns an I/O error on every read
pub struct FlakyReader {
    data: Vec<u8>,
    pos: usize,
    fail_at: usize,
}

impl FlakyReader {
    pub fn new(data: &[u8], fail_at: usize) -> Self {
        Self {
            data: data.to_vec(),
            pos: 0,
            fail_at,
        }
    }
}

impl AsyncRead for FlakyReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.pos >= this.fail_at {
            return Poll::Ready(Err(io::Error::other("device unplugged")));
        }
        let end = this.fail_at.min(this.pos + buf.remaining()).min(this.data.len());
        buf.put_slice(&this.data[this.pos..end]);
        this.pos = end;
        Poll::Ready(Ok(()))
    }
}

/// Serves `data` at most `step` bytes per read
pub struct TrickleReader {
    data: Vec<u8>,
    pos: usize,
    step: usize,
}

impl TrickleReader {
    pub fn new(data: &[u8], step: usize) -> Self {
        Self {
            data: data.to_vec(),
            pos: 0,
            step,
        }
    }
}

impl AsyncRead for TrickleReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let end = this
            .data
            .len()
            .min(this.pos + this.step)
            .min(this.pos + buf.remaining());
        buf.put_slice(&this.data[this.pos..end]);
        this.pos = end;
        Poll::Ready(Ok(()))
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Create a temporary file with the given content
pub fn create_temp_file(content: &[u8]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let file_path = dir.path().join("story.txt");
    std::fs::write(&file_path, content).expect("Failed to write temp file");
    (dir, file_path)
}

// ============================================================================
// CLI
// ============================================================================

/// Result of running the CLI
#[derive(Debug)]
pub struct CliResponse {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CliResponse {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Build a command for the binary with an isolated config dir and a clean
/// environment
pub fn chunkpost_command(args: &[&str], config_dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_chunkpost"));
    cmd.args(args);
    cmd.env("CHUNKPOST_CONFIG_DIR", config_dir);
    cmd.env_remove("JOB_ITEM_MSG_NOTIF_HOST");
    cmd.env_remove("JOB_ITEM_CREATE_URL");
    cmd.env_remove("JOB_ITEM_APP_ID");
    cmd.env_remove("RUST_LOG");
    // keep ./.env out of the picture
    cmd.current_dir(config_dir);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd
}

/// Run the binary with `args`, an isolated config dir, and extra env vars
pub fn chunkpost(args: &[&str], config_dir: &Path, env: &[(&str, &str)]) -> CliResponse {
    let mut cmd = chunkpost_command(args, config_dir);
    for (key, value) in env {
        cmd.env(key, value);
    }

    parse_output(cmd.output().expect("Failed to execute command"))
}

fn parse_output(output: Output) -> CliResponse {
    CliResponse {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(1),
    }
}
