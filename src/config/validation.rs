//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, ports valid)
//! - Reject empty label names and unparsable URLs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ConfigValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use url::Url;

use crate::config::schema::AppConfig;
use crate::validator::{validate_path, validate_port};

/// One semantic problem, tagged with the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ConfigValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigValidationError {}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ConfigValidationError>> {
    let mut errors = Vec::new();

    let labels = &config.labels;
    for (field, value) in [
        ("labels.domain", &labels.domain),
        ("labels.port", &labels.port),
        ("labels.path", &labels.path),
        ("labels.ssl", &labels.ssl),
        ("labels.certificate_prefix", &labels.certificate_prefix),
        ("infrastructure.project_label", &config.infrastructure.project_label),
        ("infrastructure.project", &config.infrastructure.project),
        ("infrastructure.service_label", &config.infrastructure.service_label),
        ("infrastructure.nginx_service", &config.infrastructure.nginx_service),
    ] {
        if value.trim().is_empty() {
            errors.push(ConfigValidationError::new(field, "must not be empty"));
        }
    }

    if !validate_path(&labels.default_path) {
        errors.push(ConfigValidationError::new(
            "labels.default_path",
            "must start with `/` and be a plain location prefix",
        ));
    }

    for (field, port) in [
        ("labels.default_port", labels.default_port),
        ("nginx.http_port", config.nginx.http_port),
        ("nginx.https_port", config.nginx.https_port),
    ] {
        if !validate_port(i64::from(port)) {
            errors.push(ConfigValidationError::new(field, format!("invalid port {}", port)));
        }
    }

    if config.scheduler.interval_secs == 0 {
        errors.push(ConfigValidationError::new("scheduler.interval_secs", "must be greater than 0"));
    }

    if config.certificates.validity_days == 0 {
        errors.push(ConfigValidationError::new("certificates.validity_days", "must be greater than 0"));
    }

    if config.certificates.default_branch.trim().is_empty() {
        errors.push(ConfigValidationError::new("certificates.default_branch", "must not be empty"));
    }

    if let Err(e) = Url::parse(&config.certificates.github_api_url) {
        errors.push(ConfigValidationError::new("certificates.github_api_url", e.to_string()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(ConfigValidationError::new(
            "observability.metrics_address",
            format!("`{}` is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
