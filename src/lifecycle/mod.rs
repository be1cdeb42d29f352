//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     AppConfig → certificate providers → CertificateService
//!              → ProxyTopologyBuilder + NginxService → Reconciler
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → reconciler finishes its pass → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then collaborators, then the loop
//! - A pass in progress is never cancelled; shutdown is observed between passes

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{build_reconciler, build_reconciler_with, StartupError};
