//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use docker_proxy::certificate::{
    CertificateProvider, CertificateService, Github, GithubClient, ProviderRegistry, SelfSigned,
};
use docker_proxy::config::{InfrastructureConfig, LabelConfig};
use docker_proxy::docker::{Container, ContainerInventory, DockerError, DockerResult, Network, NetworkAttachment};
use docker_proxy::proxy::ProxyTopologyBuilder;

pub const PROXY_NETWORK_ID: &str = "proxy-net";

/// Inventory call, recorded in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListContainers,
    ListNetworks,
    Connect { network: String, container: String },
    Get(String),
    Execute { container: String, argv: Vec<String> },
}

#[derive(Default)]
struct State {
    containers: Vec<Container>,
    networks: Vec<Network>,
    /// Address handed out when a container is connected to a network.
    connect_ips: HashMap<String, String>,
    calls: Vec<Call>,
}

/// In-memory `ContainerInventory`.
#[derive(Default, Clone)]
pub struct FakeInventory {
    state: Arc<Mutex<State>>,
}

impl FakeInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_proxy_network(self) -> Self {
        self.add_network(Network {
            id: PROXY_NETWORK_ID.to_string(),
            name: "docker-proxy_default".to_string(),
            labels: labels(&[("com.docker.compose.project", "docker-proxy")]),
        })
    }

    pub fn with_nginx(self) -> Self {
        self.add_container(container(
            "nginx-id",
            "docker-proxy_nginx_1",
            &[
                ("com.docker.compose.project", "docker-proxy"),
                ("com.docker.compose.service", "nginx"),
            ],
            Some("172.18.0.2"),
        ))
    }

    pub fn add_network(self, network: Network) -> Self {
        self.state.lock().unwrap().networks.push(network);
        self
    }

    pub fn add_container(self, container: Container) -> Self {
        self.state.lock().unwrap().containers.push(container);
        self
    }

    /// `container_id` gets `ip` on the network it is connected to.
    pub fn on_connect(self, container_id: &str, ip: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .connect_ips
            .insert(container_id.to_string(), ip.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| predicate(call)).count()
    }
}

#[async_trait]
impl ContainerInventory for FakeInventory {
    async fn list_containers(&self) -> DockerResult<Vec<Container>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListContainers);
        Ok(state.containers.clone())
    }

    async fn list_networks(&self) -> DockerResult<Vec<Network>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListNetworks);
        Ok(state.networks.clone())
    }

    async fn connect_container(&self, network_id: &str, container_id: &str) -> DockerResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Connect {
            network: network_id.to_string(),
            container: container_id.to_string(),
        });

        let ip = state.connect_ips.get(container_id).cloned().unwrap_or_default();
        if let Some(container) = state.containers.iter_mut().find(|c| c.id == container_id) {
            container
                .networks
                .insert(network_id.to_string(), NetworkAttachment { ip });
        }
        Ok(())
    }

    async fn get_container(&self, container_id: &str) -> DockerResult<Container> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Get(container_id.to_string()));
        state
            .containers
            .iter()
            .find(|c| c.id == container_id)
            .cloned()
            .ok_or_else(|| DockerError::Api {
                status: 404,
                message: format!("No such container: {}", container_id),
            })
    }

    async fn execute_command(&self, container_id: &str, argv: &[&str]) -> DockerResult<()> {
        self.state.lock().unwrap().calls.push(Call::Execute {
            container: container_id.to_string(),
            argv: argv.iter().map(|arg| arg.to_string()).collect(),
        });
        Ok(())
    }
}

pub fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

/// A container, attached to the proxy network when `proxy_ip` is given.
pub fn container(id: &str, name: &str, pairs: &[(&str, &str)], proxy_ip: Option<&str>) -> Container {
    let mut networks = BTreeMap::new();
    if let Some(ip) = proxy_ip {
        networks.insert(PROXY_NETWORK_ID.to_string(), NetworkAttachment { ip: ip.to_string() });
    }
    Container {
        id: id.to_string(),
        name: name.to_string(),
        labels: labels(pairs),
        networks,
    }
}

/// reqwest client ignoring proxy environment variables.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

pub fn builder(inventory: &FakeInventory, certificate_dir: &Path, github_url: &str) -> ProxyTopologyBuilder {
    let github = Github::new(GithubClient::with_client(http_client(), github_url).unwrap(), "master");
    let registry = ProviderRegistry::new(vec![CertificateProvider::Github(github)], SelfSigned::default());
    let certificates = CertificateService::new(registry, certificate_dir).unwrap();

    ProxyTopologyBuilder::new(
        Arc::new(inventory.clone()),
        certificates,
        LabelConfig::default(),
        InfrastructureConfig::default(),
    )
}

/// PEM certificate and private key for `domain`.
pub fn issue_pem(domain: &str) -> (String, String) {
    let key_pair = KeyPair::generate().unwrap();
    let mut params = CertificateParams::new(vec![domain.to_string()]).unwrap();
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, domain);
    params.distinguished_name = dn;
    let certificate = params.self_signed(&key_pair).unwrap();
    (certificate.pem(), key_pair.serialize_pem())
}

/// Request seen by a recording backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub target: String,
    pub headers: HashMap<String, String>,
}

/// Start a mock HTTP backend answering by request target (path and query).
/// Unknown targets get a 404.
pub async fn start_recording_backend(
    routes: HashMap<String, (u16, String)>,
) -> (SocketAddr, Arc<Mutex<Vec<RecordedRequest>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorded = Arc::new(Mutex::new(Vec::new()));
    let routes = Arc::new(routes);

    let log = recorded.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let log = log.clone();
                    let routes = routes.clone();
                    tokio::spawn(async move {
                        let mut raw = Vec::new();
                        let mut buf = [0u8; 4096];
                        while !raw.windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => break,
                                Ok(n) => raw.extend_from_slice(&buf[..n]),
                            }
                        }

                        let request = parse_request(&String::from_utf8_lossy(&raw));
                        let (status, body) = routes
                            .get(&request.target)
                            .cloned()
                            .unwrap_or((404, "{\"message\":\"Not Found\"}".to_string()));
                        log.lock().unwrap().push(request);

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_line(status),
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, recorded)
}

fn parse_request(raw: &str) -> RecordedRequest {
    let mut lines = raw.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split(' ');
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default().to_string();
    let headers = lines
        .take_while(|line| !line.is_empty())
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();
    RecordedRequest {
        method,
        target,
        headers,
    }
}

fn status_line(status: u16) -> &'static str {
    match status {
        200 => "200 OK",
        401 => "401 Unauthorized",
        403 => "403 Forbidden",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        _ => "200 OK",
    }
}
