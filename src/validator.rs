//! Syntax checks applied at every entity construction boundary.
//!
//! # Design Decisions
//! - Pure predicates, no state
//! - Entities call these in their constructors and refuse to exist otherwise
//! - Domains are matched case-insensitively against the DNS hostname grammar

use std::net::Ipv4Addr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static DOMAIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?$")
        .expect("domain regex is valid")
});

/// Rejected construction input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("domain `{0}` must respect the RFC")]
    InvalidDomain(String),

    #[error("ip `{0}` must be a valid IPv4 address")]
    InvalidIpv4(String),

    #[error("port `{0}` must be between 1 and 65535")]
    InvalidPort(i64),

    #[error("path `{0}` must start with `/` and contain no whitespace, quotes, `;`, `#`, `{{` or `}}`")]
    InvalidPath(String),
}

/// True iff `domain` is a hostname of at least two labels, each 1-63 chars
/// of `[a-z0-9]` with internal hyphens only.
pub fn validate_domain(domain: &str) -> bool {
    DOMAIN_REGEX.is_match(domain)
}

/// True iff `ip` is four dot-separated octets in 0-255.
pub fn validate_ipv4(ip: &str) -> bool {
    ip.parse::<Ipv4Addr>().is_ok()
}

pub fn validate_port(port: i64) -> bool {
    (1..=65535).contains(&port)
}

/// True iff `path` is an absolute location prefix safe to embed in an nginx
/// `location` block.
pub fn validate_path(path: &str) -> bool {
    path.starts_with('/')
        && !path
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, ';' | '{' | '}' | '#' | '"' | '\'' | '\\'))
}

/// Check a location path, failing with `InvalidPath` when it is unsafe.
pub fn ensure_path(path: &str) -> Result<(), ValidationError> {
    if validate_path(path) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPath(path.to_string()))
    }
}

/// Check a domain, failing with `InvalidDomain` when it is malformed.
pub fn ensure_domain(domain: &str) -> Result<(), ValidationError> {
    if validate_domain(domain) {
        Ok(())
    } else {
        Err(ValidationError::InvalidDomain(domain.to_string()))
    }
}

/// Check a port, narrowing it to `u16` on success.
pub fn ensure_port(port: i64) -> Result<u16, ValidationError> {
    if validate_port(port) {
        Ok(port as u16)
    } else {
        Err(ValidationError::InvalidPort(port))
    }
}
