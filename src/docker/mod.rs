//! Container inventory subsystem.
//!
//! # Data Flow
//! ```text
//! Docker Engine API (unix socket)
//!     → client.rs (HTTP/1.1 request per call, JSON decoding)
//!     → models.rs (Container, Network)
//!     → ContainerInventory trait consumed by topology building and reload
//! ```
//!
//! # Design Decisions
//! - The trait is the seam: tests and alternative runtimes plug in here
//! - Calls block the reconciliation pass until they return; no internal timeout
//! - Attachments are keyed by network id, names carry no leading `/`

pub mod client;
pub mod error;
pub mod models;

use async_trait::async_trait;

pub use client::DockerClient;
pub use error::{DockerError, DockerResult};
pub use models::{Container, Network, NetworkAttachment};

/// Operations the proxy needs from the container runtime.
#[async_trait]
pub trait ContainerInventory: Send + Sync {
    async fn list_containers(&self) -> DockerResult<Vec<Container>>;

    async fn list_networks(&self) -> DockerResult<Vec<Network>>;

    async fn connect_container(&self, network_id: &str, container_id: &str) -> DockerResult<()>;

    async fn get_container(&self, container_id: &str) -> DockerResult<Container>;

    async fn execute_command(&self, container_id: &str, argv: &[&str]) -> DockerResult<()>;
}
