//! chunkpost library interface
//!
//! Streams a file to an HTTP endpoint in paced, fixed-size chunks.
//!
//! # Module Organization
//!
//! - [`pipeline`] - The scan loop (ScanHandle, ChunkedDeliveryPipeline, ScanReport)
//! - [`sink`] - Delivery targets (Sink, DeliveryOutcome, HttpSink)
//! - [`config`] - Defaults, config file, `.env` and environment
//! - [`lock`] - PID-file single-instance lock
//! - [`server`] - Hello-world HTTP server
//! - [`job`] - Job creation request
//! - [`errors`] - Error types (ChunkpostError, Result)
//! - [`status`] - Exit status codes (ExitStatus)
//! - [`core`] - Command dispatch

pub mod cli;
pub mod config;
pub mod core;
pub mod errors;
pub mod job;
pub mod lock;
pub mod logging;
pub mod pipeline;
pub mod server;
pub mod sink;
pub mod status;
