//! Metrics collection and exposition.
//!
//! # Metrics
//! - `docker_proxy_reconcile_total` (counter): passes by outcome
//! - `docker_proxy_certificates_total` (counter): certificate resolutions by outcome, provider
//! - `docker_proxy_proxies` (gauge): domains in the last topology
//! - `docker_proxy_servers` (gauge): servers in the last topology

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder with its scrape listener. Needs a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_reconcile(outcome: &'static str) {
    ::metrics::counter!("docker_proxy_reconcile_total", "outcome" => outcome).increment(1);
}

pub fn record_certificate(outcome: &'static str, provider: &'static str) {
    ::metrics::counter!(
        "docker_proxy_certificates_total",
        "outcome" => outcome,
        "provider" => provider
    )
    .increment(1);
}

pub fn record_topology(proxies: usize, servers: usize) {
    ::metrics::gauge!("docker_proxy_proxies").set(proxies as f64);
    ::metrics::gauge!("docker_proxy_servers").set(servers as f64);
}
