//! Per-domain routing aggregate and the topology snapshot.

use std::collections::btree_map::{BTreeMap, Entry};

use crate::certificate::Certificate;
use crate::proxy::server::Server;
use crate::validator::{ensure_domain, ValidationError};

pub const DEFAULT_PATH: &str = "/";

/// One domain, its optional certificate and its backends grouped by path.
///
/// Paths keep the order in which they were first seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proxy {
    domain: String,
    certificate: Option<Certificate>,
    servers: Vec<(String, Vec<Server>)>,
}

impl Proxy {
    pub fn new(domain: impl Into<String>, certificate: Option<Certificate>) -> Result<Self, ValidationError> {
        let domain = domain.into();
        ensure_domain(&domain)?;

        Ok(Self {
            domain,
            certificate,
            servers: Vec::new(),
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn certificate(&self) -> Option<&Certificate> {
        self.certificate.as_ref()
    }

    pub fn has_ssl(&self) -> bool {
        self.certificate.is_some()
    }

    /// Append a server at `path`, keeping encounter order. Duplicates are kept.
    pub fn add_server(&mut self, server: Server, path: impl Into<String>) -> &mut Self {
        let path = path.into();
        match self.servers.iter_mut().find(|(existing, _)| *existing == path) {
            Some((_, servers)) => servers.push(server),
            None => self.servers.push((path, vec![server])),
        }
        self
    }

    /// A different path already present whose upstream name would equal
    /// `path`'s once `/` becomes `_`.
    pub fn conflicting_path(&self, path: &str) -> Option<&str> {
        let key = path.replace('/', "_");
        self.paths().find(|existing| *existing != path && existing.replace('/', "_") == key)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.servers.iter().map(|(path, _)| path.as_str())
    }

    /// Servers at `path`, empty when nothing routes there.
    pub fn servers(&self, path: &str) -> &[Server] {
        self.servers
            .iter()
            .find(|(existing, _)| existing == path)
            .map(|(_, servers)| servers.as_slice())
            .unwrap_or(&[])
    }

    pub fn server_count(&self) -> usize {
        self.servers.iter().map(|(_, servers)| servers.len()).sum()
    }
}

/// All proxies of one reconciliation pass, unique by domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    proxies: BTreeMap<String, Proxy>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.proxies.contains_key(domain)
    }

    pub fn get(&self, domain: &str) -> Option<&Proxy> {
        self.proxies.get(domain)
    }

    pub fn get_mut(&mut self, domain: &str) -> Option<&mut Proxy> {
        self.proxies.get_mut(domain)
    }

    /// Insert a proxy unless its domain is already present; returns the stored one.
    pub fn get_or_insert(&mut self, proxy: Proxy) -> &mut Proxy {
        match self.proxies.entry(proxy.domain.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(proxy),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Proxy> {
        self.proxies.values()
    }

    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.proxies.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    pub fn server_count(&self) -> usize {
        self.proxies.values().map(Proxy::server_count).sum()
    }
}

impl<'a> IntoIterator for &'a Topology {
    type Item = &'a Proxy;
    type IntoIter = std::collections::btree_map::Values<'a, String, Proxy>;

    fn into_iter(self) -> Self::IntoIter {
        self.proxies.values()
    }
}
