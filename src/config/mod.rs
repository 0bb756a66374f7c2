//! Configuration: defaults, config file, `.env`, and environment

#[allow(clippy::module_inception)]
pub mod config;
pub mod env;

pub use config::{
    parse_duration, Config, JobSettings, ServeSettings, StreamSettings, DEFAULT_SINK_URL,
};
pub use env::EnvVars;
