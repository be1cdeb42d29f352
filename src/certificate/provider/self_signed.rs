//! Self-signed certificate generation.

use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair, RsaKeySize, PKCS_RSA_SHA256};
use time::{Duration, OffsetDateTime};

use crate::certificate::error::CertificateResult;
use crate::certificate::material::Certificate;

pub const DEFAULT_VALIDITY_DAYS: u32 = 365;

/// Issues a 2048-bit RSA certificate signed by its own key.
#[derive(Debug, Clone)]
pub struct SelfSigned {
    validity_days: u32,
}

impl SelfSigned {
    pub const NAME: &'static str = "self-signed";

    pub fn new(validity_days: u32) -> Self {
        Self { validity_days }
    }

    pub fn validity_days(&self) -> u32 {
        self.validity_days
    }

    /// Generate a key pair and certificate for the domain. Any chain left by
    /// an earlier provider is removed.
    pub fn create_certificate(&self, certificate: &Certificate) -> CertificateResult<()> {
        tracing::info!(domain = %certificate.domain(), "Creating self-signed certificate");

        let key_pair = KeyPair::generate_rsa_for(&PKCS_RSA_SHA256, RsaKeySize::_2048)?;

        let mut params = CertificateParams::new(vec![certificate.domain().to_string()])?;
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, certificate.domain());
        params.distinguished_name = dn;

        let now = OffsetDateTime::now_utc();
        params.not_before = now;
        params.not_after = now + Duration::days(i64::from(self.validity_days));

        let signed = params.self_signed(&key_pair)?;

        certificate.write_certificate(&signed.pem())?;
        certificate.write_private_key(&key_pair.serialize_pem())?;
        certificate.remove_certificate_chain()?;
        Ok(())
    }
}

impl Default for SelfSigned {
    fn default() -> Self {
        Self::new(DEFAULT_VALIDITY_DAYS)
    }
}
