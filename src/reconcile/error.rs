//! Reconciliation errors.

use thiserror::Error;

use crate::docker::DockerError;
use crate::nginx::NginxError;
use crate::proxy::TopologyError;

/// Any failure aborting one pass.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("topology: {0}")]
    Topology(#[from] TopologyError),

    #[error("nginx: {0}")]
    Nginx(#[from] NginxError),

    #[error("nginx reload in container `{container}` failed: {source}")]
    Reload {
        container: String,
        #[source]
        source: DockerError,
    },
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;
