//! Routing topology.
//!
//! # Data Flow
//! ```text
//! ContainerInventory
//!     → builder.rs (proxy network lookup, label parsing, attach, certificates)
//!     → Proxy per domain (site.rs) holding Servers per path (server.rs)
//!     → Topology snapshot
//!     → nginx::NginxService renders it
//! ```
//!
//! # Design Decisions
//! - A fresh Topology per pass; nothing carries over between passes
//! - The first container seen for a domain decides its certificate
//! - Path groups and proxies are ordered maps so rendering is deterministic

pub mod builder;
pub mod error;
pub mod server;
pub mod site;

pub use builder::ProxyTopologyBuilder;
pub use error::{TopologyError, TopologyResult};
pub use server::Server;
pub use site::{Proxy, Topology, DEFAULT_PATH};
