//! docker-proxy library.
//!
//! Discovers labelled containers, groups them into sites keyed by domain,
//! keeps their TLS certificates valid on disk and publishes the result as
//! nginx virtual hosts.

pub mod certificate;
pub mod config;
pub mod docker;
pub mod lifecycle;
pub mod nginx;
pub mod observability;
pub mod proxy;
pub mod reconcile;
pub mod validator;

pub use config::AppConfig;
pub use lifecycle::Shutdown;
pub use reconcile::Reconciler;
