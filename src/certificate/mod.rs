//! Certificate lifecycle subsystem.
//!
//! # Data Flow
//! ```text
//! (domain, provider options)
//!     → service.rs (reuse fast path: is_valid && !is_expired)
//!     → provider/ (self-signed generation or repository fetch)
//!     → material.rs (files under <root>/<domain>/)
//!     → re-check is_valid, or fail naming the domain
//! ```
//!
//! # Design Decisions
//! - Files on disk are the durable state; `Certificate` values are rebuilt each pass
//! - Writes are not atomic; a truncated file fails `is_valid` and is reissued next pass
//! - Chain files are optional and never part of validity

pub mod error;
pub mod material;
pub mod provider;
pub mod service;

pub use error::{CertificateError, CertificateResult};
pub use material::Certificate;
pub use provider::{CertificateProvider, Github, GithubClient, ProviderOptions, ProviderRegistry, SelfSigned};
pub use service::{CertificateService, Resolution};
