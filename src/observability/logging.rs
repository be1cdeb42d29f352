//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global `tracing` subscriber once at startup
//! - Configure log level from the environment, falling back to config
//!
//! # Design Decisions
//! - JSON format for production, text format for development
//! - `RUST_LOG` wins over the configured level

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

/// Filter directive for a configured level such as `info`.
pub fn default_directive(level: &str) -> String {
    format!("docker_proxy={level},docker_proxy::certificate={level},warn", level = level)
}

pub fn init(level: &str, format: LogFormat) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    let text = (format == LogFormat::Text).then(|| tracing_subscriber::fmt::layer());
    let json = (format == LogFormat::Json).then(|| tracing_subscriber::fmt::layer().json());

    tracing_subscriber::registry().with(filter).with(text).with(json).try_init()
}
