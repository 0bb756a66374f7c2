//! CLI argument parsing

pub mod args;

pub use args::{Args, Command, CreateJobArgs, LogFormat, ServeArgs, StreamArgs};
