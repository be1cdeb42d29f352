//! Certificate error definitions.

use std::path::PathBuf;

use thiserror::Error;

use crate::validator::ValidationError;

/// Errors raised while reading, issuing or fetching certificate material.
#[derive(Debug, Error)]
pub enum CertificateError {
    /// Construction input rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A certificate file could not be opened, read or written.
    #[error("unable to access `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Fewer bytes reached the file than were supplied.
    #[error("unable to write file `{}`: wrote {written} of {expected} bytes", path.display())]
    ShortWrite {
        path: PathBuf,
        written: usize,
        expected: usize,
    },

    /// No chain file location was configured for this certificate.
    #[error("no certificate chain location configured for domain `{0}`")]
    ChainNotConfigured(String),

    /// The stored certificate is not a parseable X.509 PEM.
    #[error("unable to parse certificate `{}`: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    /// A provider option required by the selected provider is absent.
    #[error("missing parameter `{0}`")]
    MissingParameter(&'static str),

    /// A provider option holds a value the provider cannot use.
    #[error("invalid parameter `{0}`")]
    InvalidParameter(&'static str),

    /// The remote repository answered with an error status.
    #[error("remote repository answered {status}: {reason}")]
    Remote { status: u16, reason: String },

    /// The remote repository could not be reached.
    #[error("remote repository request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote repository URL could not be built.
    #[error("invalid remote repository url: {0}")]
    Url(#[from] url::ParseError),

    /// Key generation, signing or export failed.
    #[error("cryptographic failure: {0}")]
    Crypto(String),

    /// A provider ran but left an unusable certificate behind.
    #[error("unable to create certificate for domain `{0}`")]
    Issuance(String),

    /// The configured certificate root is not a directory.
    #[error("`{}` is not a directory", .0.display())]
    NotADirectory(PathBuf),
}

impl From<rcgen::Error> for CertificateError {
    fn from(err: rcgen::Error) -> Self {
        CertificateError::Crypto(err.to_string())
    }
}

/// Result type for certificate operations.
pub type CertificateResult<T> = Result<T, CertificateError>;
