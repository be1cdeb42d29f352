//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn a validated `AppConfig` into a ready `Reconciler`
//! - Initialize subsystems in dependency order: inventory, certificates, topology, nginx
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The inventory is injectable so the whole pipeline runs against fakes in tests

use std::sync::Arc;

use thiserror::Error;

use crate::certificate::{
    CertificateError, CertificateProvider, CertificateService, Github, GithubClient, ProviderRegistry, SelfSigned,
};
use crate::config::AppConfig;
use crate::docker::{ContainerInventory, DockerClient};
use crate::nginx::{NginxError, NginxService};
use crate::proxy::ProxyTopologyBuilder;
use crate::reconcile::Reconciler;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("certificate subsystem: {0}")]
    Certificate(#[from] CertificateError),

    #[error("nginx subsystem: {0}")]
    Nginx(#[from] NginxError),
}

pub type StartupResult<T> = Result<T, StartupError>;

/// Registry with every known provider; unknown names fall back to self-signed.
pub fn provider_registry(config: &AppConfig) -> StartupResult<ProviderRegistry> {
    let certificates = &config.certificates;
    let github = Github::new(
        GithubClient::new(&certificates.github_api_url)?,
        certificates.default_branch.as_str(),
    );
    let self_signed = SelfSigned::new(certificates.validity_days);

    Ok(ProviderRegistry::new(
        vec![
            CertificateProvider::SelfSigned(self_signed.clone()),
            CertificateProvider::Github(github),
        ],
        self_signed,
    ))
}

/// Wire the reconciler against the Docker daemon named in the config.
pub fn build_reconciler(config: &AppConfig) -> StartupResult<Reconciler> {
    let inventory: Arc<dyn ContainerInventory> = Arc::new(DockerClient::new(&config.docker.socket_path));
    build_reconciler_with(config, inventory)
}

pub fn build_reconciler_with(config: &AppConfig, inventory: Arc<dyn ContainerInventory>) -> StartupResult<Reconciler> {
    let certificates = CertificateService::new(provider_registry(config)?, &config.certificates.directory)?;
    tracing::info!(
        directory = %certificates.directory().display(),
        providers = ?certificates.providers().names(),
        "Certificate service ready"
    );

    let builder = ProxyTopologyBuilder::new(
        inventory,
        certificates,
        config.labels.clone(),
        config.infrastructure.clone(),
    );

    let nginx = NginxService::new(
        &config.nginx.virtual_host_directory,
        &config.nginx.homepage_directory,
        config.nginx.http_port,
        config.nginx.https_port,
    )?;

    Ok(Reconciler::new(builder, nginx))
}
