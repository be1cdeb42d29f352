//! One reconciliation pass and the periodic loop around it.

use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::nginx::NginxService;
use crate::observability::metrics;
use crate::proxy::{ProxyTopologyBuilder, Topology};
use crate::reconcile::error::{ReconcileError, ReconcileResult};

/// Argv executed inside the nginx container after publication.
pub const RELOAD_COMMAND: [&str; 3] = ["nginx", "-s", "reload"];

pub struct Reconciler {
    builder: ProxyTopologyBuilder,
    nginx: NginxService,
}

impl Reconciler {
    pub fn new(builder: ProxyTopologyBuilder, nginx: NginxService) -> Self {
        Self { builder, nginx }
    }

    /// Build, publish and reload. Returns the published topology.
    pub async fn run_once(&self) -> ReconcileResult<Topology> {
        let started = Instant::now();
        let result = self.reconcile().await;

        match &result {
            Ok(topology) => {
                metrics::record_reconcile("success");
                tracing::info!(
                    proxies = topology.len(),
                    servers = topology.server_count(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Reconciliation pass complete"
                );
            }
            Err(_) => metrics::record_reconcile("failure"),
        }

        result
    }

    async fn reconcile(&self) -> ReconcileResult<Topology> {
        let (topology, containers) = self.builder.build_with_listing().await?;

        self.nginx.publish(&topology)?;

        let nginx = self.builder.nginx_container(&containers)?;
        tracing::info!(container = %nginx.name, "Reloading nginx configuration");
        self.builder
            .inventory()
            .execute_command(&nginx.id, &RELOAD_COMMAND)
            .await
            .map_err(|source| ReconcileError::Reload {
                container: nginx.name.clone(),
                source,
            })?;

        Ok(topology)
    }

    /// Run a pass on every tick until shutdown. The first tick fires immediately.
    pub async fn run(&self, interval: Duration, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_secs = interval.as_secs(), "Reconciler starting");

        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.run_once().await {
                        tracing::error!(error = %e, "Reconciliation pass failed, retrying on next tick");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Reconciler received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
