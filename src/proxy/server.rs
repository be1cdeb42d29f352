//! Backend endpoint.

use crate::validator::{ensure_port, validate_ipv4, ValidationError};

/// One container reachable on the proxy network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    id: String,
    name: String,
    ip: String,
    port: u16,
}

impl Server {
    /// Fails on a malformed IPv4 address or a port outside 1-65535.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        ip: impl Into<String>,
        port: i64,
    ) -> Result<Self, ValidationError> {
        let ip = ip.into();
        if !validate_ipv4(&ip) {
            return Err(ValidationError::InvalidIpv4(ip));
        }
        let port = ensure_port(port)?;

        Ok(Self {
            id: id.into(),
            name: name.into(),
            ip,
            port,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ip(&self) -> &str {
        &self.ip
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `ip:port`, as used in an upstream block.
    pub fn address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}
