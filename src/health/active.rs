//! Active health checking.
//!
//! # Responsibilities
//! - Drive the pool's health-check cycle on a fixed period
//! - Keep blocking probes off the async worker threads
//! - Stop cleanly on shutdown

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::load_balancer::pool::ProviderPool;
use crate::observability::metrics;

pub struct HealthMonitor {
    pool: Arc<ProviderPool>,
    config: HealthCheckConfig,
}

impl HealthMonitor {
    pub fn new(pool: Arc<ProviderPool>, config: HealthCheckConfig) -> Self {
        Self { pool, config }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Active health checks disabled");
            return;
        }

        tracing::info!(
            initial_delay_ms = self.config.initial_delay_ms,
            period_ms = self.config.period_ms,
            "Health monitor starting"
        );

        // interval_at panics on a zero period
        let period = self.config.period().max(time::Duration::from_millis(1));
        let start = Instant::now() + self.config.initial_delay();
        let mut ticker = time::interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    async fn check_all(&self) {
        let pool = self.pool.clone();
        let report = match tokio::task::spawn_blocking(move || pool.run_health_cycle()).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "Health check cycle aborted");
                return;
            }
        };

        if report.is_quiet() {
            tracing::debug!(probed = report.probed, "Health check cycle complete");
        } else {
            tracing::info!(
                probed = report.probed,
                excluded = ?report.excluded,
                recovered = ?report.recovered,
                "Health check cycle moved providers"
            );
        }

        for provider in self.pool.all_providers() {
            metrics::record_provider_health(provider.id(), self.pool.is_active(provider.id()));
            metrics::record_provider_capacity(provider.id(), provider.capacity());
        }
    }
}
