//! Nginx configuration publication.
//!
//! # Data Flow
//! ```text
//! Topology
//!     → service.rs view models (href, upstream name, server addresses)
//!     → handlebars templates (templates/*.hbs, compiled in)
//!     → <vhost dir>/<domain>.conf, <vhost dir>/default.conf, <homepage dir>/index.html
//!     → stale <domain>.conf files removed
//! ```
//!
//! # Design Decisions
//! - Templates are embedded in the binary; no runtime template directory
//! - Config output is never HTML-escaped; the homepage is
//! - Files are rewritten on every pass, nginx is reloaded by the reconciler

pub mod error;
pub mod service;

pub use error::{NginxError, NginxResult};
pub use service::{proxy_upstream, NginxService, DEFAULT_VIRTUAL_HOST_FILE};
