//! docker-proxy
//!
//! Keeps an nginx container in sync with the labelled containers of a Docker host.
//!
//! # Architecture Overview
//!
//! ```text
//!   Docker daemon (unix socket)
//!        │ containers, networks
//!        ▼
//!   ┌──────────────────────┐     ┌──────────────────────────┐
//!   │ ProxyTopologyBuilder │────▶│    CertificateService    │
//!   │  labels → Proxy/     │     │ reuse │ self-signed │    │
//!   │  Server, attach net  │     │        github            │
//!   └──────────┬───────────┘     └──────────────────────────┘
//!              │ Topology
//!              ▼
//!   ┌──────────────────────┐
//!   │     NginxService     │──▶ <domain>.conf, default.conf, index.html
//!   └──────────┬───────────┘
//!              │
//!              ▼
//!   exec `nginx -s reload` in the docker-proxy nginx container
//! ```
//!
//! `run` performs one pass; `start` repeats it on a fixed interval until
//! SIGINT or SIGTERM.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};

use docker_proxy::config::{load_or_default, AppConfig};
use docker_proxy::lifecycle::{build_reconciler, signals, Shutdown};
use docker_proxy::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "docker-proxy")]
#[command(about = "Publish labelled Docker containers behind nginx", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure and reload the proxy once
    Run,
    /// Reconfigure the proxy periodically until interrupted
    Start {
        /// Seconds between passes, overriding `scheduler.interval_secs`
        #[arg(short, long)]
        interval: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("docker-proxy: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(&config.observability.log_level, config.observability.log_format) {
        eprintln!("docker-proxy: failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "docker-proxy failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "docker-proxy starting");

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let reconciler = build_reconciler(&config)?;

    match command {
        Commands::Run => {
            reconciler.run_once().await?;
        }
        Commands::Start { interval } => {
            let interval_secs = interval.unwrap_or(config.scheduler.interval_secs);
            if interval_secs == 0 {
                return Err("interval must be greater than 0".into());
            }

            let shutdown = Shutdown::new();
            let receiver = shutdown.subscribe();
            signals::spawn_signal_handler(&shutdown);
            reconciler.run(Duration::from_secs(interval_secs), receiver).await;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
