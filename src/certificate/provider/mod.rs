//! Certificate issuance strategies.
//!
//! # Data Flow
//! ```text
//! container labels (prefix.*)
//!     → ProviderOptions (label suffix → value)
//!     → ProviderRegistry::select(options["name"])
//!     → CertificateProvider::create_certificate
//!     → certificate files written on disk
//! ```
//!
//! # Design Decisions
//! - Closed set of strategies (enum), dispatched by their stable name
//! - Unknown or absent names resolve to the self-signed fallback
//! - Options live for one resolution call and are never persisted

pub mod github;
pub mod self_signed;

use std::collections::BTreeMap;

use crate::certificate::error::{CertificateError, CertificateResult};
use crate::certificate::material::Certificate;

pub use github::{Github, GithubClient};
pub use self_signed::SelfSigned;

/// Option key naming the provider to use.
pub const PROVIDER_NAME_OPTION: &str = "name";

/// Per-call provider parameters extracted from container labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderOptions(BTreeMap<String, String>);

impl ProviderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Fetch a required option or fail naming the missing key.
    pub fn require(&self, key: &'static str) -> CertificateResult<&str> {
        self.get(key).ok_or(CertificateError::MissingParameter(key))
    }

    /// Name of the requested provider, if any.
    pub fn provider_name(&self) -> Option<&str> {
        self.get(PROVIDER_NAME_OPTION)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ProviderOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A certificate issuance strategy.
#[derive(Debug, Clone)]
pub enum CertificateProvider {
    SelfSigned(SelfSigned),
    Github(Github),
}

impl CertificateProvider {
    /// Stable identifier matched against the `name` option.
    pub fn name(&self) -> &'static str {
        match self {
            CertificateProvider::SelfSigned(_) => SelfSigned::NAME,
            CertificateProvider::Github(_) => Github::NAME,
        }
    }

    /// Populate the certificate's files.
    pub async fn create_certificate(
        &self,
        certificate: &Certificate,
        options: &ProviderOptions,
    ) -> CertificateResult<()> {
        match self {
            CertificateProvider::SelfSigned(provider) => provider.create_certificate(certificate),
            CertificateProvider::Github(provider) => provider.create_certificate(certificate, options).await,
        }
    }
}

/// Known providers plus the fallback used for unknown names.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: Vec<CertificateProvider>,
    fallback: CertificateProvider,
}

impl ProviderRegistry {
    pub fn new(providers: Vec<CertificateProvider>, fallback: SelfSigned) -> Self {
        Self {
            providers,
            fallback: CertificateProvider::SelfSigned(fallback),
        }
    }

    /// Resolve a provider by name, falling back to self-signed.
    pub fn select(&self, name: Option<&str>) -> &CertificateProvider {
        let Some(name) = name else {
            return &self.fallback;
        };

        match self.providers.iter().find(|provider| provider.name() == name) {
            Some(provider) => provider,
            None if name == self.fallback.name() => &self.fallback,
            None => {
                tracing::warn!(
                    provider = %name,
                    fallback = %self.fallback.name(),
                    "Unknown certificate provider, using fallback"
                );
                &self.fallback
            }
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.providers.iter().map(CertificateProvider::name).collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new(Vec::new(), SelfSigned::default())
    }
}
