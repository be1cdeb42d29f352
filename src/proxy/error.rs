//! Topology error definitions.

use thiserror::Error;

use crate::docker::DockerError;
use crate::validator::ValidationError;

/// Failures that abort a whole topology build.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("unable to find {project} network")]
    ProxyNetworkNotFound { project: String },

    #[error("unable to find {project} {service} container")]
    NginxContainerNotFound { project: String, service: String },

    #[error(transparent)]
    Inventory(#[from] DockerError),

    /// A container's labels or network address produced an invalid entity.
    #[error("container `{container}`: {source}")]
    Validation {
        container: String,
        #[source]
        source: ValidationError,
    },

    #[error("container `{container}`: port label `{value}` is not a number")]
    InvalidPortLabel { container: String, value: String },

    /// Two paths of one domain that would share an nginx upstream name.
    #[error("container `{container}`: path `{path}` conflicts with `{existing}`")]
    PathConflict {
        container: String,
        path: String,
        existing: String,
    },

    #[error("container `{container}` has no address on the proxy network")]
    NotOnProxyNetwork { container: String },
}

/// Result type for topology building.
pub type TopologyResult<T> = Result<T, TopologyError>;
