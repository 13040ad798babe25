//! provider-balancer demo runner.
//!
//! Drives the balancer over simulated providers: health checks run in the
//! background while batches of concurrent requests are routed on a fixed
//! interval.
//!
//! ```text
//!   request batch ──▶ LoadBalancer::get() ──▶ ProviderPool ──▶ strategy
//!                                                  ▲
//!   health monitor (initial delay, period) ────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::task::JoinSet;

use provider_balancer::config::loader::load_config;
use provider_balancer::lifecycle::{signals::wait_for_signal, startup::build_balancer};
use provider_balancer::observability::logging::init_logging;
use provider_balancer::{BalancerConfig, LoadBalancer, Shutdown};

#[derive(Parser)]
#[command(name = "provider-balancer")]
#[command(about = "Client-side load balancer over simulated providers", long_about = None)]
struct Cli {
    /// TOML configuration file; the built-in demo setup is used when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Route requests until Ctrl+C or the request limit
    Run {
        /// Stop after this many requests
        #[arg(short = 'n', long)]
        requests: Option<u64>,

        /// Pause between request batches
        #[arg(long, default_value_t = 2000)]
        interval_ms: u64,

        /// Concurrent requests per batch
        #[arg(long, default_value_t = 1)]
        concurrency: u64,

        /// Manually exclude the first provider before routing
        #[arg(long)]
        exclude_first: bool,
    },
    /// Validate the configuration and print it resolved
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => BalancerConfig::default(),
    };

    match cli.command {
        Commands::CheckConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Run {
            requests,
            interval_ms,
            concurrency,
            exclude_first,
        } => {
            init_logging(&config.observability)?;
            run(&config, requests, interval_ms, concurrency.max(1), exclude_first).await?;
        }
    }

    Ok(())
}

async fn run(
    config: &BalancerConfig,
    requests: Option<u64>,
    interval_ms: u64,
    concurrency: u64,
    exclude_first: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        strategy = ?config.strategy,
        providers = config.providers.len(),
        period_ms = config.health_check.period_ms,
        "provider-balancer starting"
    );

    let balancer = Arc::new(build_balancer(config)?);
    balancer.check_providers_scheduler();

    if exclude_first {
        if let Some(id) = balancer.pool().active_ids().first() {
            balancer.exclude_by_id(id)?;
        }
    }

    let shutdown = Shutdown::new();
    let mut stop = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms.max(1)));
    let mut sent: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let batch = match requests {
                    Some(limit) => concurrency.min(limit.saturating_sub(sent)),
                    None => concurrency,
                };
                send_batch(&balancer, batch).await;
                sent += batch;
                if requests.is_some_and(|limit| sent >= limit) {
                    break;
                }
            }
            _ = stop.recv() => break,
        }
    }

    balancer.stop_health_checks().await;
    tracing::info!(requests = sent, "Shutdown complete");
    println!("{}", serde_json::to_string_pretty(&balancer.pool().snapshot())?);
    Ok(())
}

async fn send_batch(balancer: &Arc<LoadBalancer>, batch: u64) {
    let mut tasks = JoinSet::new();
    for _ in 0..batch {
        let balancer = balancer.clone();
        tasks.spawn(async move { balancer.get() });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(id)) => tracing::info!(provider = %id, "Request served"),
            Ok(Err(e)) => tracing::warn!(error = %e, "Request rejected"),
            Err(e) => tracing::error!(error = %e, "Request task failed"),
        }
    }
}
