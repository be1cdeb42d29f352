//! Inventory error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Errors talking to the container runtime.
#[derive(Debug, Error)]
pub enum DockerError {
    /// The socket could not be reached.
    #[error("unable to connect to `{}`: {source}", path.display())]
    Connect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("invalid request: {0}")]
    Request(#[from] hyper::http::Error),

    /// The daemon answered with an error status.
    #[error("docker API answered {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid JSON from docker API: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for inventory operations.
pub type DockerResult<T> = Result<T, DockerError>;
