//! CLI argument definitions using clap
//!
//! Flags left unset fall back to the config file and environment.

use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::parse_duration;
use crate::job::parse_form_field;

/// chunkpost - stream a file to an HTTP endpoint in paced chunks
#[derive(Parser, Debug, Clone)]
#[command(
    name = "chunkpost",
    version,
    about = "Stream a file to an HTTP endpoint in paced, fixed-size chunks",
    propagate_version = true
)]
pub struct Args {
    /// Log output format
    #[arg(long = "log-format", value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Read environment defaults from this file instead of ./.env
    #[arg(long = "env-file", value_name = "PATH", global = true)]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Read FILE in chunks and POST each chunk to the sink
    Stream(StreamArgs),
    /// Run the hello-world HTTP server
    Serve(ServeArgs),
    /// Send a single job creation request
    CreateJob(CreateJobArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct StreamArgs {
    /// File to stream
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Bytes per chunk [default: 100]
    #[arg(short = 'c', long = "chunk-size", value_name = "BYTES", value_parser = parse_chunk_size)]
    pub chunk_size: Option<usize>,

    /// Pause between reads, e.g. 300ms or 1s [default: 300ms]
    #[arg(short = 'd', long = "delay", value_name = "DURATION", value_parser = parse_duration)]
    pub delay: Option<Duration>,

    /// Endpoint receiving the chunks
    #[arg(short = 's', long = "sink-url", value_name = "URL")]
    pub sink_url: Option<String>,

    /// Per-request timeout for deliveries [default: 30s]
    #[arg(long = "timeout", value_name = "DURATION", value_parser = parse_duration)]
    pub timeout: Option<Duration>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ServeArgs {
    /// Address to bind [default: 127.0.0.1]
    #[arg(long = "host", value_name = "HOST")]
    pub host: Option<String>,

    /// Port to bind [default: 2000]
    #[arg(short = 'p', long = "port", value_name = "PORT")]
    pub port: Option<u16>,

    /// PID file used to enforce a single instance [default: pid.txt]
    #[arg(long = "pid-file", value_name = "PATH")]
    pub pid_file: Option<PathBuf>,

    /// Start even if the PID file names a running process
    #[arg(long = "takeover", action = ArgAction::SetTrue)]
    pub takeover: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct CreateJobArgs {
    /// Job creation endpoint
    #[arg(long = "url", value_name = "URL")]
    pub url: Option<String>,

    /// Application id
    #[arg(long = "app-id", value_name = "ID")]
    pub app_id: Option<String>,

    /// Event name [default: print_doc.pdf]
    #[arg(long = "event", value_name = "NAME")]
    pub event: Option<String>,

    /// Form field (repeatable)
    #[arg(long = "form", value_name = "KEY=VALUE", value_parser = parse_form_field)]
    pub form: Vec<(String, String)>,

    /// Wait this long before sending
    #[arg(long = "after", value_name = "DURATION", value_parser = parse_duration)]
    pub after: Option<Duration>,

    /// Request timeout
    #[arg(long = "timeout", value_name = "DURATION", value_parser = parse_duration)]
    pub timeout: Option<Duration>,
}

/// Log output format
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Plain text output (default)
    #[default]
    Text,
    /// JSON Lines format for parsing
    Json,
}

fn parse_chunk_size(s: &str) -> Result<usize, String> {
    match s.trim().parse::<usize>() {
        Ok(0) => Err("chunk size must be greater than zero".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("'{}': {}", s, e)),
    }
}
