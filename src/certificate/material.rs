//! On-disk certificate material for one domain.
//!
//! # Responsibilities
//! - Own the three file locations (certificate, private key, optional chain)
//! - Read and write each file with scoped handles
//! - Answer expiry and validity questions from the stored PEM content
//!
//! # Design Decisions
//! - The in-memory value is disposable; the files are the durable state
//! - `is_valid` never fails: any parse or match error means "not usable"
//! - Expiry is evaluated against `not_after`, with `not_after == now` expired

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use rcgen::{KeyPair, PublicKeyData};
use time::OffsetDateTime;
use x509_parser::pem::parse_x509_pem;

use crate::certificate::error::{CertificateError, CertificateResult};
use crate::validator::{ensure_domain, ValidationError};

pub const CERTIFICATE_FILENAME: &str = "certificate.pem";
pub const PRIVATE_KEY_FILENAME: &str = "privatekey.pem";
pub const CHAIN_FILENAME: &str = "chain.pem";

/// Certificate material for a single domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    domain: String,
    certificate_path: PathBuf,
    private_key_path: PathBuf,
    chain_path: Option<PathBuf>,
}

/// Fields extracted from a parsed certificate.
#[derive(Debug, Clone)]
struct CertificateInfo {
    common_name: Option<String>,
    not_before: OffsetDateTime,
    not_after: OffsetDateTime,
    public_key_info: Vec<u8>,
}

impl Certificate {
    /// Create a certificate handle; fails if `domain` is not a valid hostname.
    pub fn new(
        domain: impl Into<String>,
        certificate_path: impl Into<PathBuf>,
        private_key_path: impl Into<PathBuf>,
        chain_path: Option<PathBuf>,
    ) -> Result<Self, ValidationError> {
        let domain = domain.into();
        ensure_domain(&domain)?;

        Ok(Self {
            domain,
            certificate_path: certificate_path.into(),
            private_key_path: private_key_path.into(),
            chain_path,
        })
    }

    /// Certificate laid out as `<directory>/{certificate,privatekey,chain}.pem`.
    pub fn in_directory(domain: impl Into<String>, directory: &Path) -> Result<Self, ValidationError> {
        Self::new(
            domain,
            directory.join(CERTIFICATE_FILENAME),
            directory.join(PRIVATE_KEY_FILENAME),
            Some(directory.join(CHAIN_FILENAME)),
        )
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn certificate_path(&self) -> &Path {
        &self.certificate_path
    }

    pub fn private_key_path(&self) -> &Path {
        &self.private_key_path
    }

    pub fn chain_path(&self) -> Option<&Path> {
        self.chain_path.as_deref()
    }

    /// True iff a chain file exists on disk.
    pub fn has_certificate_chain(&self) -> bool {
        self.chain_path.as_deref().is_some_and(Path::is_file)
    }

    pub fn write_certificate(&self, certificate: &str) -> CertificateResult<()> {
        write_file(&self.certificate_path, certificate)
    }

    pub fn write_private_key(&self, private_key: &str) -> CertificateResult<()> {
        write_file(&self.private_key_path, private_key)
    }

    pub fn write_certificate_chain(&self, chain: &str) -> CertificateResult<()> {
        let path = self
            .chain_path
            .as_deref()
            .ok_or_else(|| CertificateError::ChainNotConfigured(self.domain.clone()))?;
        write_file(path, chain)
    }

    /// Delete the chain file if present. A missing file is not an error.
    pub fn remove_certificate_chain(&self) -> CertificateResult<()> {
        let Some(path) = self.chain_path.as_deref() else {
            return Ok(());
        };
        match fs::remove_file(path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(CertificateError::Io {
                path: path.to_path_buf(),
                source: e,
            }),
            _ => Ok(()),
        }
    }

    pub fn read_certificate(&self) -> CertificateResult<String> {
        read_file(&self.certificate_path)
    }

    pub fn read_private_key(&self) -> CertificateResult<String> {
        read_file(&self.private_key_path)
    }

    pub fn read_certificate_chain(&self) -> CertificateResult<String> {
        let path = self
            .chain_path
            .as_deref()
            .ok_or_else(|| CertificateError::ChainNotConfigured(self.domain.clone()))?;
        read_file(path)
    }

    /// Start of the validity window.
    pub fn start_date(&self) -> CertificateResult<OffsetDateTime> {
        Ok(self.inspect()?.not_before)
    }

    /// End of the validity window.
    pub fn expire_date(&self) -> CertificateResult<OffsetDateTime> {
        Ok(self.inspect()?.not_after)
    }

    /// Whether the certificate is expired right now.
    ///
    /// A missing or unparseable certificate is an error, never "not expired".
    pub fn is_expired(&self) -> CertificateResult<bool> {
        self.is_expired_at(OffsetDateTime::now_utc())
    }

    pub fn is_expired_at(&self, now: OffsetDateTime) -> CertificateResult<bool> {
        Ok(self.expire_date()? <= now)
    }

    /// Best-effort health check: the common name equals the domain and the
    /// stored private key belongs to the stored certificate.
    pub fn is_valid(&self) -> bool {
        match self.check_material() {
            Ok(valid) => valid,
            Err(e) => {
                tracing::debug!(domain = %self.domain, error = %e, "Certificate material unusable");
                false
            }
        }
    }

    fn check_material(&self) -> CertificateResult<bool> {
        let info = self.inspect()?;
        if info.common_name.as_deref() != Some(self.domain.as_str()) {
            return Ok(false);
        }

        let key_pair = KeyPair::from_pem(&self.read_private_key()?)?;
        Ok(key_pair.subject_public_key_info() == info.public_key_info)
    }

    fn inspect(&self) -> CertificateResult<CertificateInfo> {
        let content = self.read_certificate()?;
        let parse_error = |reason: String| CertificateError::Parse {
            path: self.certificate_path.clone(),
            reason,
        };

        let (_, pem) = parse_x509_pem(content.as_bytes()).map_err(|e| parse_error(e.to_string()))?;
        let x509 = pem.parse_x509().map_err(|e| parse_error(e.to_string()))?;
        let validity = x509.validity();

        let info = CertificateInfo {
            common_name: x509
                .subject()
                .iter_common_name()
                .next()
                .and_then(|cn| cn.as_str().ok())
                .map(str::to_owned),
            not_before: validity.not_before.to_datetime(),
            not_after: validity.not_after.to_datetime(),
            public_key_info: x509.public_key().raw.to_vec(),
        };
        Ok(info)
    }
}

fn write_file(path: &Path, content: &str) -> CertificateResult<()> {
    let io_error = |source: std::io::Error| CertificateError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::create(path).map_err(io_error)?;
    let bytes = content.as_bytes();
    let mut written = 0;
    while written < bytes.len() {
        match file.write(&bytes[written..]) {
            Ok(0) => {
                return Err(CertificateError::ShortWrite {
                    path: path.to_path_buf(),
                    written,
                    expected: bytes.len(),
                })
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(io_error(e)),
        }
    }
    file.flush().map_err(io_error)
}

fn read_file(path: &Path) -> CertificateResult<String> {
    fs::read_to_string(path).map_err(|source| CertificateError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcgen::{CertificateParams, DistinguishedName, DnType};
    use time::Duration;

    fn issue(common_name: &str, not_before: OffsetDateTime, not_after: OffsetDateTime) -> (String, String) {
        let key_pair = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(vec![common_name.to_string()]).unwrap();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, common_name);
        params.distinguished_name = dn;
        params.not_before = not_before;
        params.not_after = not_after;
        let cert = params.self_signed(&key_pair).unwrap();
        (cert.pem(), key_pair.serialize_pem())
    }

    fn certificate(dir: &Path, domain: &str) -> Certificate {
        Certificate::in_directory(domain, dir).unwrap()
    }

    #[test]
    fn test_rejects_invalid_domain() {
        let err = Certificate::new("not a domain", "/tmp/c.pem", "/tmp/k.pem", None).unwrap_err();
        assert_eq!(err, ValidationError::InvalidDomain("not a domain".into()));
    }

    #[test]
    fn test_layout_in_directory() {
        let cert = certificate(Path::new("/certs/example.com"), "example.com");
        assert_eq!(cert.certificate_path(), Path::new("/certs/example.com/certificate.pem"));
        assert_eq!(cert.private_key_path(), Path::new("/certs/example.com/privatekey.pem"));
        assert_eq!(cert.chain_path(), Some(Path::new("/certs/example.com/chain.pem")));
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let cert = certificate(dir.path(), "example.com");

        cert.write_certificate("certificate content\n").unwrap();
        cert.write_private_key("key content").unwrap();
        assert!(!cert.has_certificate_chain());
        cert.write_certificate_chain("chain content").unwrap();

        assert_eq!(cert.read_certificate().unwrap(), "certificate content\n");
        assert_eq!(cert.read_private_key().unwrap(), "key content");
        assert_eq!(cert.read_certificate_chain().unwrap(), "chain content");
        assert!(cert.has_certificate_chain());
    }

    #[test]
    fn test_remove_chain() {
        let dir = tempfile::tempdir().unwrap();
        let cert = certificate(dir.path(), "example.com");

        cert.remove_certificate_chain().unwrap();
        cert.write_certificate_chain("chain content").unwrap();
        assert!(cert.has_certificate_chain());

        cert.remove_certificate_chain().unwrap();
        assert!(!cert.has_certificate_chain());

        let without = Certificate::new("example.com", "/tmp/c.pem", "/tmp/k.pem", None).unwrap();
        without.remove_certificate_chain().unwrap();
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cert = certificate(&dir.path().join("absent"), "example.com");
        let err = cert.write_certificate("content").unwrap_err();
        assert!(matches!(err, CertificateError::Io { .. }));
    }

    #[test]
    fn test_chain_without_location() {
        let cert = Certificate::new("example.com", "/tmp/c.pem", "/tmp/k.pem", None).unwrap();
        assert!(!cert.has_certificate_chain());
        assert!(matches!(
            cert.write_certificate_chain("x"),
            Err(CertificateError::ChainNotConfigured(_))
        ));
    }

    #[test]
    fn test_dates_and_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let cert = certificate(dir.path(), "example.com");
        let start = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let end = start + Duration::days(90);
        let (pem, key) = issue("example.com", start, end);
        cert.write_certificate(&pem).unwrap();
        cert.write_private_key(&key).unwrap();

        assert_eq!(cert.start_date().unwrap(), start);
        assert_eq!(cert.expire_date().unwrap(), end);
        assert!(!cert.is_expired_at(end - Duration::seconds(1)).unwrap());
        assert!(cert.is_expired_at(end).unwrap());
        assert!(cert.is_expired_at(end + Duration::days(1)).unwrap());
        assert!(cert.is_expired().unwrap());
    }

    #[test]
    fn test_expiry_of_garbage_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cert = certificate(dir.path(), "example.com");
        assert!(matches!(cert.is_expired(), Err(CertificateError::Io { .. })));

        cert.write_certificate("-----BEGIN CERTIFICATE-----\nbm9wZQ==\n-----END CERTIFICATE-----\n")
            .unwrap();
        assert!(matches!(cert.is_expired(), Err(CertificateError::Parse { .. })));
        assert!(cert.start_date().is_err());
    }

    #[test]
    fn test_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let cert = certificate(dir.path(), "example.com");
        assert!(!cert.is_valid());

        let now = OffsetDateTime::now_utc();
        let (pem, key) = issue("example.com", now, now + Duration::days(30));
        cert.write_certificate(&pem).unwrap();
        cert.write_private_key(&key).unwrap();
        assert!(cert.is_valid());
    }

    #[test]
    fn test_is_valid_rejects_other_common_name() {
        let dir = tempfile::tempdir().unwrap();
        let cert = certificate(dir.path(), "example.com");
        let now = OffsetDateTime::now_utc();
        let (pem, key) = issue("other.example.com", now, now + Duration::days(30));
        cert.write_certificate(&pem).unwrap();
        cert.write_private_key(&key).unwrap();
        assert!(!cert.is_valid());
    }

    #[test]
    fn test_is_valid_rejects_foreign_key() {
        let dir = tempfile::tempdir().unwrap();
        let cert = certificate(dir.path(), "example.com");
        let now = OffsetDateTime::now_utc();
        let (pem, _) = issue("example.com", now, now + Duration::days(30));
        let (_, other_key) = issue("example.com", now, now + Duration::days(30));
        cert.write_certificate(&pem).unwrap();
        cert.write_private_key(&other_key).unwrap();
        assert!(!cert.is_valid());

        cert.write_private_key("not a key").unwrap();
        assert!(!cert.is_valid());
    }
}
