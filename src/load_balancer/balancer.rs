//! Load balancer façade.
//!
//! # Responsibilities
//! - Serve `get()`: select, take a slot, forward, give the slot back
//! - Own the background health-check task (start once, stop on demand or drop)
//! - Pass manual exclusion and inclusion through to the pool

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::config::HealthCheckConfig;
use crate::health::active::HealthMonitor;
use crate::lifecycle::Shutdown;
use crate::load_balancer::{error::BalancerResult, pool::ProviderPool};
use crate::observability::metrics;

/// Handle to the running health-check task.
#[derive(Debug)]
struct HealthScheduler {
    shutdown: Shutdown,
    handle: JoinHandle<()>,
}

#[derive(Debug)]
pub struct LoadBalancer {
    pool: Arc<ProviderPool>,
    health_check: HealthCheckConfig,
    scheduler: Mutex<Option<HealthScheduler>>,
}

impl LoadBalancer {
    pub fn new(pool: ProviderPool, health_check: HealthCheckConfig) -> Self {
        Self {
            pool: Arc::new(pool),
            health_check,
            scheduler: Mutex::new(None),
        }
    }

    pub fn pool(&self) -> &Arc<ProviderPool> {
        &self.pool
    }

    /// Route one request and return the id of the provider that served it.
    ///
    /// On success the provider's capacity is unchanged afterwards. On error
    /// no capacity was touched.
    pub fn get(&self) -> BalancerResult<String> {
        let lease = match self.pool.acquire() {
            Ok(lease) => lease,
            Err(e) => {
                tracing::debug!(error = %e, "Provider selection failed");
                metrics::record_selection_error(e.kind());
                return Err(e);
            }
        };
        metrics::record_selection(self.pool.strategy_name());

        let id = lease.identify();
        drop(lease);

        tracing::debug!(provider = %id, "Request served");
        Ok(id)
    }

    /// Start the periodic health-check task on the current tokio runtime.
    ///
    /// Returns false if the task is already running, health checks are
    /// disabled, or no runtime is available.
    pub fn check_providers_scheduler(&self) -> bool {
        if !self.health_check.enabled {
            tracing::info!("Active health checks disabled");
            return false;
        }

        let mut scheduler = self.scheduler.lock();
        if scheduler.is_some() {
            tracing::debug!("Health check scheduler already running");
            return false;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(error = %e, "Cannot start health checks outside a tokio runtime");
                return false;
            }
        };

        let shutdown = Shutdown::new();
        let monitor = HealthMonitor::new(self.pool.clone(), self.health_check.clone());
        let handle = runtime.spawn(monitor.run(shutdown.subscribe()));

        *scheduler = Some(HealthScheduler { shutdown, handle });
        true
    }

    pub fn is_health_check_running(&self) -> bool {
        self.scheduler
            .lock()
            .as_ref()
            .is_some_and(|s| !s.handle.is_finished())
    }

    /// Stop the health-check task and wait for it to exit.
    pub async fn stop_health_checks(&self) {
        let Some(scheduler) = self.scheduler.lock().take() else {
            return;
        };
        scheduler.shutdown.trigger();
        if let Err(e) = scheduler.handle.await {
            tracing::warn!(error = %e, "Health monitor task ended abnormally");
        }
    }

    pub fn exclude_by_id(&self, id: &str) -> BalancerResult<()> {
        self.pool.exclude_by_id(id)
    }

    pub fn include_by_id(&self, id: &str) -> BalancerResult<()> {
        self.pool.include_by_id(id)
    }
}

impl Drop for LoadBalancer {
    fn drop(&mut self) {
        if let Some(scheduler) = self.scheduler.get_mut().take() {
            scheduler.shutdown.trigger();
        }
    }
}
