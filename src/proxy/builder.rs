//! Container inventory → `Topology`.

use std::sync::Arc;

use crate::certificate::{Certificate, CertificateService, ProviderOptions};
use crate::config::{InfrastructureConfig, LabelConfig};
use crate::docker::{Container, ContainerInventory, Network};
use crate::observability::metrics;
use crate::proxy::error::{TopologyError, TopologyResult};
use crate::proxy::server::Server;
use crate::proxy::site::{Proxy, Topology};
use crate::validator::{ensure_domain, ensure_path};

/// Builds one topology snapshot per call from live inventory.
pub struct ProxyTopologyBuilder {
    inventory: Arc<dyn ContainerInventory>,
    certificates: CertificateService,
    labels: LabelConfig,
    infrastructure: InfrastructureConfig,
}

impl ProxyTopologyBuilder {
    pub fn new(
        inventory: Arc<dyn ContainerInventory>,
        certificates: CertificateService,
        labels: LabelConfig,
        infrastructure: InfrastructureConfig,
    ) -> Self {
        Self {
            inventory,
            certificates,
            labels,
            infrastructure,
        }
    }

    pub fn inventory(&self) -> &Arc<dyn ContainerInventory> {
        &self.inventory
    }

    /// Group labelled containers into proxies keyed by domain.
    ///
    /// Containers missing from the proxy network are connected to it and
    /// re-inspected. Certificate failures only downgrade the domain to HTTP;
    /// inventory and label errors abort the build.
    pub async fn build(&self) -> TopologyResult<Topology> {
        Ok(self.build_with_listing().await?.0)
    }

    /// Same as `build`, also returning the container listing the topology was
    /// built from so one pass lists containers once.
    pub async fn build_with_listing(&self) -> TopologyResult<(Topology, Vec<Container>)> {
        let network = self.proxy_network().await?;
        let containers = self.inventory.list_containers().await?;
        let mut topology = Topology::new();

        for container in &containers {
            let Some(domain) = container.label(&self.labels.domain).map(str::to_owned) else {
                continue;
            };

            let path = container
                .label(&self.labels.path)
                .unwrap_or(self.labels.default_path.as_str())
                .to_string();
            ensure_path(&path).map_err(|source| TopologyError::Validation {
                container: container.name.clone(),
                source,
            })?;

            if !topology.contains(&domain) {
                ensure_domain(&domain).map_err(|source| TopologyError::Validation {
                    container: container.name.clone(),
                    source,
                })?;
                let certificate = self.resolve_certificate(&domain, container).await;
                let proxy = Proxy::new(domain.as_str(), certificate).map_err(|source| TopologyError::Validation {
                    container: container.name.clone(),
                    source,
                })?;
                topology.get_or_insert(proxy);
            }

            let attached = self.ensure_attached(container.clone(), &network).await?;
            let server = self.server_for(&attached, &network)?;

            tracing::debug!(domain = %domain, container = %attached.name, path = %path, "Adding server");
            if let Some(proxy) = topology.get_mut(&domain) {
                if let Some(existing) = proxy.conflicting_path(&path) {
                    return Err(TopologyError::PathConflict {
                        container: attached.name.clone(),
                        path,
                        existing: existing.to_string(),
                    });
                }
                proxy.add_server(server, path);
            }
        }

        metrics::record_topology(topology.len(), topology.server_count());
        Ok((topology, containers))
    }

    /// The network carrying docker-proxy's own compose project label.
    pub async fn proxy_network(&self) -> TopologyResult<Network> {
        let infra = &self.infrastructure;
        self.inventory
            .list_networks()
            .await?
            .into_iter()
            .find(|network| network.has_label(&infra.project_label, &infra.project))
            .ok_or_else(|| TopologyError::ProxyNetworkNotFound {
                project: infra.project.clone(),
            })
    }

    /// The nginx container of docker-proxy's compose project, looked up in an
    /// existing listing.
    pub fn nginx_container<'a>(&self, containers: &'a [Container]) -> TopologyResult<&'a Container> {
        let infra = &self.infrastructure;
        containers
            .iter()
            .find(|container| {
                container.has_label(&infra.project_label, &infra.project)
                    && container.has_label(&infra.service_label, &infra.nginx_service)
            })
            .ok_or_else(|| TopologyError::NginxContainerNotFound {
                project: infra.project.clone(),
                service: infra.nginx_service.clone(),
            })
    }

    async fn resolve_certificate(&self, domain: &str, container: &Container) -> Option<Certificate> {
        if !container.label(&self.labels.ssl).is_some_and(parse_bool) {
            return None;
        }

        let options = provider_options(container, &self.labels.certificate_prefix);
        match self.certificates.get_certificate(domain, &options).await {
            Ok(resolution) => Some(resolution.into_certificate()),
            Err(e) => {
                tracing::error!(
                    domain = %domain,
                    container = %container.name,
                    error = %e,
                    "Certificate unavailable, serving domain over HTTP"
                );
                None
            }
        }
    }

    async fn ensure_attached(&self, container: Container, network: &Network) -> TopologyResult<Container> {
        if container.is_attached_to(&network.id) {
            return Ok(container);
        }

        self.inventory.connect_container(&network.id, &container.id).await?;
        Ok(self.inventory.get_container(&container.id).await?)
    }

    fn server_for(&self, container: &Container, network: &Network) -> TopologyResult<Server> {
        let attachment = container
            .network(&network.id)
            .ok_or_else(|| TopologyError::NotOnProxyNetwork {
                container: container.name.clone(),
            })?;

        let port = match container.label(&self.labels.port) {
            Some(value) => value.trim().parse::<i64>().map_err(|_| TopologyError::InvalidPortLabel {
                container: container.name.clone(),
                value: value.to_string(),
            })?,
            None => i64::from(self.labels.default_port),
        };

        Server::new(container.id.as_str(), container.name.as_str(), attachment.ip.as_str(), port).map_err(|source| {
            TopologyError::Validation {
                container: container.name.clone(),
                source,
            }
        })
    }
}

/// Truthy label values: `1`, `true`, `on`, `yes`, case-insensitive.
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}

/// Labels `<prefix>.<key>` become option `<key>`.
pub fn provider_options(container: &Container, prefix: &str) -> ProviderOptions {
    container
        .labels
        .iter()
        .filter_map(|(key, value)| {
            let key = key.strip_prefix(prefix)?.strip_prefix('.')?;
            (!key.is_empty()).then(|| (key.to_string(), value.clone()))
        })
        .collect()
}
