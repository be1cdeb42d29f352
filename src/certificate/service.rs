//! Reuse-or-reissue decisions per domain.
//!
//! # Responsibilities
//! - Lay out `<root>/<domain>/` and create it on demand
//! - Return a still-usable certificate untouched
//! - Otherwise run exactly one provider and verify what it produced
//!
//! # Design Decisions
//! - Single-flight: reconciliation passes never overlap, so two resolutions
//!   for the same domain cannot race. A concurrent scheduler would need a
//!   per-domain lock around `get_certificate`.
//! - A provider is never trusted: its output is re-checked with `is_valid`

use std::fs;
use std::path::{Path, PathBuf};

use crate::certificate::error::{CertificateError, CertificateResult};
use crate::certificate::material::Certificate;
use crate::certificate::provider::{ProviderOptions, ProviderRegistry};
use crate::observability::metrics;

/// How a certificate was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The certificate on disk was valid and unexpired.
    Reused(Certificate),
    /// A provider (re)issued the certificate.
    Issued {
        certificate: Certificate,
        provider: &'static str,
    },
}

impl Resolution {
    pub fn certificate(&self) -> &Certificate {
        match self {
            Resolution::Reused(certificate) => certificate,
            Resolution::Issued { certificate, .. } => certificate,
        }
    }

    pub fn into_certificate(self) -> Certificate {
        match self {
            Resolution::Reused(certificate) => certificate,
            Resolution::Issued { certificate, .. } => certificate,
        }
    }

    pub fn is_reused(&self) -> bool {
        matches!(self, Resolution::Reused(_))
    }
}

/// Resolves a usable certificate for a domain.
#[derive(Debug, Clone)]
pub struct CertificateService {
    providers: ProviderRegistry,
    directory: PathBuf,
}

impl CertificateService {
    /// Fails if `directory` does not exist or is not a directory.
    pub fn new(providers: ProviderRegistry, directory: impl Into<PathBuf>) -> CertificateResult<Self> {
        let directory = directory.into();
        if !directory.is_dir() {
            return Err(CertificateError::NotADirectory(directory));
        }

        Ok(Self { providers, directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub async fn get_certificate(&self, domain: &str, options: &ProviderOptions) -> CertificateResult<Resolution> {
        let certificate = self.prepare_certificate(domain)?;

        if certificate.is_valid() && !certificate.is_expired().unwrap_or(true) {
            tracing::info!(domain = %domain, "Certificate is valid, reusing it");
            metrics::record_certificate("reused", "none");
            return Ok(Resolution::Reused(certificate));
        }

        let provider = self.providers.select(options.provider_name());
        tracing::info!(domain = %domain, provider = %provider.name(), "Issuing certificate");

        if let Err(e) = provider.create_certificate(&certificate, options).await {
            metrics::record_certificate("failed", provider.name());
            return Err(e);
        }

        if !certificate.is_valid() {
            metrics::record_certificate("failed", provider.name());
            return Err(CertificateError::Issuance(domain.to_string()));
        }

        metrics::record_certificate("issued", provider.name());
        Ok(Resolution::Issued {
            certificate,
            provider: provider.name(),
        })
    }

    fn prepare_certificate(&self, domain: &str) -> CertificateResult<Certificate> {
        let domain_directory = self.directory.join(domain);
        // Validated before the domain is used as a path on disk.
        let certificate = Certificate::in_directory(domain, &domain_directory)?;

        if !domain_directory.is_dir() {
            fs::create_dir_all(&domain_directory).map_err(|source| CertificateError::Io {
                path: domain_directory.clone(),
                source,
            })?;
        }

        Ok(certificate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate::provider::SelfSigned;

    fn service(dir: &Path) -> CertificateService {
        CertificateService::new(ProviderRegistry::default(), dir).unwrap()
    }

    #[test]
    fn test_rejects_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let err = CertificateService::new(ProviderRegistry::default(), &missing).unwrap_err();
        assert!(matches!(err, CertificateError::NotADirectory(path) if path == missing));
    }

    #[tokio::test]
    async fn test_issues_then_reuses() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        let first = service
            .get_certificate("c.example.com", &ProviderOptions::new())
            .await
            .unwrap();
        assert!(matches!(first, Resolution::Issued { provider: "self-signed", .. }));
        assert!(first.certificate().is_valid());
        assert!(dir.path().join("c.example.com").join("certificate.pem").is_file());

        let pem = first.certificate().read_certificate().unwrap();
        let second = service
            .get_certificate("c.example.com", &ProviderOptions::new())
            .await
            .unwrap();
        assert!(second.is_reused());
        assert_eq!(second.certificate().read_certificate().unwrap(), pem);
    }

    #[tokio::test]
    async fn test_reissues_mismatched_material() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        // A valid certificate for a different name, stored under this domain.
        let foreign = Certificate::in_directory("other.example.com", &dir.path().join("d.example.com")).unwrap();
        fs::create_dir_all(dir.path().join("d.example.com")).unwrap();
        SelfSigned::default().create_certificate(&foreign).unwrap();

        let resolution = service
            .get_certificate("d.example.com", &ProviderOptions::new())
            .await
            .unwrap();
        assert!(!resolution.is_reused());
        assert!(resolution.certificate().is_valid());
    }

    #[tokio::test]
    async fn test_unknown_provider_falls_back_to_self_signed() {
        let dir = tempfile::tempdir().unwrap();
        let options: ProviderOptions = [("name", "letsencrypt")].into_iter().collect();

        let resolution = service(dir.path()).get_certificate("e.example.com", &options).await.unwrap();
        assert!(matches!(resolution, Resolution::Issued { provider: "self-signed", .. }));
    }

    #[tokio::test]
    async fn test_invalid_domain_is_rejected_before_disk() {
        let dir = tempfile::tempdir().unwrap();
        let err = service(dir.path())
            .get_certificate("../escape", &ProviderOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CertificateError::Validation(_)));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
