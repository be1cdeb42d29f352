//! Inventory models and their Engine API wire formats.

use std::collections::BTreeMap;

use serde::Deserialize;

/// A container as seen by the proxy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Container {
    pub id: String,
    pub name: String,
    pub labels: BTreeMap<String, String>,
    /// Attachments keyed by network id.
    pub networks: BTreeMap<String, NetworkAttachment>,
}

impl Container {
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn has_label(&self, key: &str, value: &str) -> bool {
        self.label(key) == Some(value)
    }

    pub fn network(&self, network_id: &str) -> Option<&NetworkAttachment> {
        self.networks.get(network_id)
    }

    pub fn is_attached_to(&self, network_id: &str) -> bool {
        self.networks.contains_key(network_id)
    }
}

/// A container's endpoint on one network.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkAttachment {
    pub ip: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Network {
    pub id: String,
    pub name: String,
    pub labels: BTreeMap<String, String>,
}

impl Network {
    pub fn has_label(&self, key: &str, value: &str) -> bool {
        self.labels.get(key).map(String::as_str) == Some(value)
    }
}

/// Entry of `GET /containers/json`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ContainerSummary {
    id: String,
    #[serde(default)]
    names: Vec<String>,
    #[serde(default)]
    labels: Option<BTreeMap<String, String>>,
    #[serde(default)]
    network_settings: Option<NetworkSettings>,
}

/// Body of `GET /containers/{id}/json`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ContainerInspect {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    config: Option<ContainerConfig>,
    #[serde(default)]
    network_settings: Option<NetworkSettings>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerConfig {
    #[serde(default)]
    labels: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NetworkSettings {
    #[serde(default)]
    networks: Option<BTreeMap<String, EndpointSettings>>,
}

#[derive(Debug, Deserialize)]
struct EndpointSettings {
    #[serde(rename = "NetworkID", default)]
    network_id: String,
    #[serde(rename = "IPAddress", default)]
    ip_address: String,
}

/// Entry of `GET /networks`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct NetworkSummary {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    labels: Option<BTreeMap<String, String>>,
}

/// Response of `POST /containers/{id}/exec`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ExecCreated {
    pub id: String,
}

fn attachments(settings: Option<NetworkSettings>) -> BTreeMap<String, NetworkAttachment> {
    settings
        .and_then(|s| s.networks)
        .unwrap_or_default()
        .into_values()
        .filter(|endpoint| !endpoint.network_id.is_empty())
        .map(|endpoint| {
            (
                endpoint.network_id,
                NetworkAttachment {
                    ip: endpoint.ip_address,
                },
            )
        })
        .collect()
}

fn strip_name(name: &str) -> String {
    name.trim_start_matches('/').to_string()
}

impl From<ContainerSummary> for Container {
    fn from(summary: ContainerSummary) -> Self {
        Self {
            name: summary.names.first().map(|n| strip_name(n)).unwrap_or_default(),
            id: summary.id,
            labels: summary.labels.unwrap_or_default(),
            networks: attachments(summary.network_settings),
        }
    }
}

impl From<ContainerInspect> for Container {
    fn from(inspect: ContainerInspect) -> Self {
        Self {
            name: strip_name(&inspect.name),
            id: inspect.id,
            labels: inspect.config.and_then(|c| c.labels).unwrap_or_default(),
            networks: attachments(inspect.network_settings),
        }
    }
}

impl From<NetworkSummary> for Network {
    fn from(summary: NetworkSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            labels: summary.labels.unwrap_or_default(),
        }
    }
}
