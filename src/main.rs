//! swan-cluster command line.
//!
//! Builds a cluster from a config file or an endpoint list and either prints
//! its members or keeps selecting an endpoint, pinging it, and demoting it
//! on failure until interrupted.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use swan_cluster::config::{load_config, validate_config, ClusterConfig};
use swan_cluster::lifecycle::signals::wait_for_signal;
use swan_cluster::observability::{logging, metrics};
use swan_cluster::Cluster;

#[derive(Parser)]
#[command(name = "swan-cluster")]
#[command(about = "Track health of a clustered service's endpoints", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Comma-separated endpoint list, overrides the config file
    #[arg(short, long)]
    endpoints: Option<String>,

    /// Liveness path, overrides the config file
    #[arg(long)]
    ping_path: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse the endpoint list and print the members
    Status {
        /// Print members as JSON
        #[arg(long)]
        json: bool,
    },
    /// Select, ping and demote endpoints until interrupted
    Watch {
        /// Seconds between selections
        #[arg(long, default_value_t = 10)]
        every_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClusterConfig::default(),
    };
    if let Some(endpoints) = cli.endpoints {
        config.endpoints = endpoints;
    }
    if let Some(path) = cli.ping_path {
        config.probe.path = path;
    }
    if let Err(errors) = validate_config(&config) {
        for e in &errors {
            eprintln!("invalid configuration: {}", e);
        }
        std::process::exit(2);
    }

    logging::init_logging(&config.observability.log_level);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let cluster = Arc::new(Cluster::from_config(&config)?);

    match cli.command {
        Commands::Status { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&cluster.members())?);
            } else {
                for member in cluster.members() {
                    println!("{}\t{}", member.endpoint, member.status);
                }
            }
        }
        Commands::Watch { every_secs } => {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(config.probe.timeout_secs))
                .build()?;
            let path = config.probe.path.clone();
            let every = Duration::from_secs(every_secs.max(1));

            tokio::select! {
                _ = watch(&cluster, &client, &path, every) => {}
                _ = wait_for_signal() => {}
            }
        }
    }

    cluster.shutdown().await;
    Ok(())
}

async fn watch(cluster: &Cluster, client: &reqwest::Client, path: &str, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;

        let endpoint = match cluster.select() {
            Ok(endpoint) => endpoint,
            Err(e) => {
                tracing::error!(error = %e, down = ?cluster.inactive_members(), "Cluster unavailable");
                continue;
            }
        };

        let url = format!("{}/{}", endpoint, path.trim_start_matches('/'));
        match client.get(&url).send().await {
            Ok(res) if res.status().is_success() => {
                tracing::info!(
                    endpoint = %endpoint,
                    up = cluster.active_members().len(),
                    down = cluster.inactive_members().len(),
                    "Endpoint healthy"
                );
            }
            Ok(res) => {
                tracing::warn!(endpoint = %endpoint, status = %res.status(), "Endpoint unhealthy");
                cluster.demote(&endpoint);
            }
            Err(e) => {
                tracing::warn!(endpoint = %endpoint, error = %e, "Endpoint unreachable");
                cluster.demote(&endpoint);
            }
        }
    }
}
