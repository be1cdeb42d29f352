//! Renders the topology into nginx configuration files.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use handlebars::Handlebars;
use serde::Serialize;

use crate::nginx::error::{NginxError, NginxResult};
use crate::proxy::{Proxy, Topology, DEFAULT_PATH};
use crate::validator::ensure_port;

pub const DEFAULT_VIRTUAL_HOST_FILE: &str = "default.conf";
pub const HOMEPAGE_FILE: &str = "index.html";

const PROXY_TEMPLATE: &str = "proxy.conf";
const DEFAULT_TEMPLATE: &str = "default.conf";
const HOMEPAGE_TEMPLATE: &str = "index.html";

#[derive(Serialize)]
struct SslView {
    certificate: String,
    private_key: String,
    chain: Option<String>,
}

#[derive(Serialize)]
struct LocationView<'a> {
    path: &'a str,
    upstream: String,
    href: String,
    servers: Vec<String>,
    server_count: usize,
}

#[derive(Serialize)]
struct ProxyView<'a> {
    domain: &'a str,
    https_port: u16,
    ssl: Option<SslView>,
    locations: Vec<LocationView<'a>>,
}

#[derive(Serialize)]
struct DefaultView<'a> {
    document_root: &'a str,
}

#[derive(Serialize)]
struct HomepageView<'a> {
    proxies: Vec<ProxyView<'a>>,
}

/// Upstream block name: dots of the domain become `_`, then the path with
/// `/` turned into `_` unless it is the root path.
pub fn proxy_upstream(proxy: &Proxy, path: &str) -> String {
    let mut upstream = proxy.domain().replace('.', "_");
    if path != DEFAULT_PATH {
        upstream.push_str(&path.replace('/', "_"));
    }
    upstream
}

pub struct NginxService {
    config: Handlebars<'static>,
    html: Handlebars<'static>,
    virtual_host_directory: PathBuf,
    homepage_directory: PathBuf,
    http_port: u16,
    https_port: u16,
}

impl NginxService {
    /// Both directories must already exist.
    pub fn new(
        virtual_host_directory: impl Into<PathBuf>,
        homepage_directory: impl Into<PathBuf>,
        http_port: u16,
        https_port: u16,
    ) -> NginxResult<Self> {
        let virtual_host_directory = virtual_host_directory.into();
        if !virtual_host_directory.is_dir() {
            return Err(NginxError::NotADirectory(virtual_host_directory));
        }
        let homepage_directory = homepage_directory.into();
        if !homepage_directory.is_dir() {
            return Err(NginxError::NotADirectory(homepage_directory));
        }
        ensure_port(i64::from(http_port))?;
        ensure_port(i64::from(https_port))?;

        let mut config = Handlebars::new();
        config.register_escape_fn(handlebars::no_escape);
        config.register_template_string(PROXY_TEMPLATE, include_str!("../../templates/proxy.conf.hbs"))?;
        config.register_template_string(DEFAULT_TEMPLATE, include_str!("../../templates/default.conf.hbs"))?;

        let mut html = Handlebars::new();
        html.register_template_string(HOMEPAGE_TEMPLATE, include_str!("../../templates/index.html.hbs"))?;

        Ok(Self {
            config,
            html,
            virtual_host_directory,
            homepage_directory,
            http_port,
            https_port,
        })
    }

    pub fn virtual_host_directory(&self) -> &Path {
        &self.virtual_host_directory
    }

    pub fn homepage_directory(&self) -> &Path {
        &self.homepage_directory
    }

    /// `scheme://domain:port<path>`, https with the https port when the proxy has SSL.
    pub fn proxy_href(&self, proxy: &Proxy, path: &str) -> String {
        let (scheme, port) = if proxy.has_ssl() {
            ("https", self.https_port)
        } else {
            ("http", self.http_port)
        };
        format!("{}://{}:{}{}", scheme, proxy.domain(), port, path)
    }

    pub fn virtual_host_path(&self, proxy: &Proxy) -> PathBuf {
        self.virtual_host_directory.join(format!("{}.conf", proxy.domain()))
    }

    /// Write every virtual host and the homepage, then drop stale vhosts.
    pub fn publish(&self, topology: &Topology) -> NginxResult<()> {
        for proxy in topology {
            self.create_proxy_virtual_host(proxy)?;
        }
        self.create_homepage(topology)?;
        self.delete_stale_virtual_hosts(topology)?;
        Ok(())
    }

    pub fn create_proxy_virtual_host(&self, proxy: &Proxy) -> NginxResult<PathBuf> {
        let content = self.config.render(PROXY_TEMPLATE, &self.proxy_view(proxy))?;
        let path = self.virtual_host_path(proxy);
        write(&path, &content)?;
        tracing::debug!(domain = %proxy.domain(), path = %path.display(), "Virtual host written");
        Ok(path)
    }

    /// Default virtual host plus the `index.html` listing every site.
    pub fn create_homepage(&self, topology: &Topology) -> NginxResult<()> {
        let document_root = self.homepage_directory.to_string_lossy();
        let default = self.config.render(
            DEFAULT_TEMPLATE,
            &DefaultView {
                document_root: &document_root,
            },
        )?;
        write(&self.virtual_host_directory.join(DEFAULT_VIRTUAL_HOST_FILE), &default)?;

        let homepage = self.html.render(
            HOMEPAGE_TEMPLATE,
            &HomepageView {
                proxies: topology.iter().map(|proxy| self.proxy_view(proxy)).collect(),
            },
        )?;
        write(&self.homepage_directory.join(HOMEPAGE_FILE), &homepage)
    }

    /// Remove `*.conf` files that are neither the default host nor a current proxy.
    pub fn delete_stale_virtual_hosts(&self, topology: &Topology) -> NginxResult<Vec<PathBuf>> {
        let mut keep: BTreeSet<String> = topology.domains().map(|domain| format!("{}.conf", domain)).collect();
        keep.insert(DEFAULT_VIRTUAL_HOST_FILE.to_string());

        let entries = fs::read_dir(&self.virtual_host_directory).map_err(|source| NginxError::Io {
            path: self.virtual_host_directory.clone(),
            source,
        })?;

        let mut deleted = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| NginxError::Io {
                    path: self.virtual_host_directory.clone(),
                    source,
                })?
                .path();

            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !path.is_file() || !name.ends_with(".conf") || keep.contains(name) {
                continue;
            }

            fs::remove_file(&path).map_err(|source| NginxError::Io {
                path: path.clone(),
                source,
            })?;
            tracing::info!(path = %path.display(), "Removed stale virtual host");
            deleted.push(path);
        }

        Ok(deleted)
    }

    fn proxy_view<'a>(&self, proxy: &'a Proxy) -> ProxyView<'a> {
        let ssl = proxy.certificate().map(|certificate| SslView {
            certificate: certificate.certificate_path().display().to_string(),
            private_key: certificate.private_key_path().display().to_string(),
            chain: certificate
                .chain_path()
                .filter(|_| certificate.has_certificate_chain())
                .map(|path| path.display().to_string()),
        });

        let locations = proxy
            .paths()
            .map(|path| {
                let servers: Vec<String> = proxy.servers(path).iter().map(|server| server.address()).collect();
                LocationView {
                    path,
                    upstream: proxy_upstream(proxy, path),
                    href: self.proxy_href(proxy, path),
                    server_count: servers.len(),
                    servers,
                }
            })
            .collect();

        ProxyView {
            domain: proxy.domain(),
            https_port: self.https_port,
            ssl,
            locations,
        }
    }
}

fn write(path: &Path, content: &str) -> NginxResult<()> {
    fs::write(path, content).map_err(|source| NginxError::Io {
        path: path.to_path_buf(),
        source,
    })
}
