//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for docker-proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Docker daemon connection.
    pub docker: DockerConfig,

    /// Label names read from site containers.
    pub labels: LabelConfig,

    /// Labels identifying docker-proxy's own network and nginx container.
    pub infrastructure: InfrastructureConfig,

    /// Certificate storage and providers.
    pub certificates: CertificateConfig,

    /// Nginx output directories and ports.
    pub nginx: NginxConfig,

    /// Periodic reconciliation.
    pub scheduler: SchedulerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DockerConfig {
    /// Path of the Docker Engine unix socket.
    pub socket_path: PathBuf,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(crate::docker::client::DEFAULT_SOCKET_PATH),
        }
    }
}

/// Container labels that describe a site.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct LabelConfig {
    /// Domain served by the container. Containers without it are ignored.
    pub domain: String,

    /// Container port to proxy to.
    pub port: String,

    /// URL path prefix routed to the container.
    pub path: String,

    /// Boolean enabling HTTPS for the domain.
    pub ssl: String,

    /// Prefix of provider option labels (`<prefix>.<key>`).
    pub certificate_prefix: String,

    /// Port used when the port label is absent.
    pub default_port: u16,

    /// Path used when the path label is absent.
    pub default_path: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            domain: "docker-proxy.domain".to_string(),
            port: "docker-proxy.port".to_string(),
            path: "docker-proxy.path".to_string(),
            ssl: "docker-proxy.ssl".to_string(),
            certificate_prefix: "docker-proxy.certificate".to_string(),
            default_port: 80,
            default_path: "/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct InfrastructureConfig {
    pub project_label: String,
    pub project: String,
    pub service_label: String,
    pub nginx_service: String,
}

impl Default for InfrastructureConfig {
    fn default() -> Self {
        Self {
            project_label: "com.docker.compose.project".to_string(),
            project: "docker-proxy".to_string(),
            service_label: "com.docker.compose.service".to_string(),
            nginx_service: "nginx".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CertificateConfig {
    /// Root directory; each domain gets `<directory>/<domain>/`.
    pub directory: PathBuf,

    /// Lifetime of self-signed certificates.
    pub validity_days: u32,

    /// Base URL of the GitHub contents API.
    pub github_api_url: String,

    /// Ref used when a container does not set `branch`.
    pub default_branch: String,
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("/etc/docker-proxy/certificates"),
            validity_days: crate::certificate::provider::self_signed::DEFAULT_VALIDITY_DAYS,
            github_api_url: crate::certificate::provider::github::DEFAULT_API_URL.to_string(),
            default_branch: crate::certificate::provider::github::DEFAULT_BRANCH.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NginxConfig {
    /// Directory nginx includes virtual hosts from.
    pub virtual_host_directory: PathBuf,

    /// Document root of the default server.
    pub homepage_directory: PathBuf,

    pub http_port: u16,
    pub https_port: u16,
}

impl Default for NginxConfig {
    fn default() -> Self {
        Self {
            virtual_host_directory: PathBuf::from("/etc/nginx/conf.d"),
            homepage_directory: PathBuf::from("/usr/share/nginx/html"),
            http_port: 80,
            https_port: 443,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between two reconciliation passes.
    pub interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { interval_secs: 5 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.labels, LabelConfig::default());
        assert_eq!(config.scheduler.interval_secs, 5);
        assert_eq!(config.nginx.https_port, 443);
        assert_eq!(config.certificates.default_branch, "master");
        assert_eq!(config.observability.log_format, LogFormat::Text);
    }

    #[test]
    fn test_partial_sections() {
        let config: AppConfig = toml::from_str(
            r#"
            [labels]
            domain = "proxy.domain"

            [nginx]
            virtual_host_directory = "/tmp/vhosts"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.labels.domain, "proxy.domain");
        assert_eq!(config.labels.port, "docker-proxy.port");
        assert_eq!(config.nginx.virtual_host_directory, PathBuf::from("/tmp/vhosts"));
        assert_eq!(config.nginx.http_port, 80);
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }
}
