//! Reconciliation subsystem.
//!
//! # Data Flow
//! ```text
//! interval tick (or a single `run` invocation)
//!     → ProxyTopologyBuilder::build (inventory + certificates)
//!     → NginxService::publish (vhosts, homepage, stale cleanup)
//!     → nginx container lookup
//!     → `nginx -s reload` executed in it
//! ```
//!
//! # Design Decisions
//! - Single-flight: each pass is awaited inline before the next tick, so
//!   certificate issuance for a domain never runs concurrently
//! - A failed pass is logged and retried on the next tick
//! - Missed ticks are delayed, not bursted

pub mod error;
pub mod reconciler;

pub use error::{ReconcileError, ReconcileResult};
pub use reconciler::{Reconciler, RELOAD_COMMAND};
