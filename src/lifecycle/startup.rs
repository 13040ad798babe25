//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn validated configuration into providers
//! - Build the pool and the load balancer façade
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Health checks are started by the caller, once a runtime is available

use std::sync::Arc;

use thiserror::Error;

use crate::config::{validation::validate_config, BalancerConfig, ProbeConfig, ProviderConfig};
use crate::config::loader::ConfigError;
use crate::health::probe::{AlwaysDown, AlwaysUp, HealthProbe, RandomProbe};
use crate::load_balancer::{build_strategy, BalancerError, LoadBalancer, Provider, ProviderPool};

/// Error raised while assembling the balancer.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("pool construction failed: {0}")]
    Pool(#[from] BalancerError),
}

/// Build the probe described by configuration.
pub fn build_probe(config: ProbeConfig) -> Box<dyn HealthProbe> {
    match config {
        ProbeConfig::Random { success_rate } => Box::new(RandomProbe::new(success_rate)),
        ProbeConfig::AlwaysUp => Box::new(AlwaysUp),
        ProbeConfig::AlwaysDown => Box::new(AlwaysDown),
    }
}

/// Build a provider, generating an id when none is configured.
pub fn build_provider(config: &ProviderConfig) -> Provider {
    let probe = build_probe(config.probe);
    match &config.id {
        Some(id) => Provider::new(id.clone(), config.capacity, probe),
        None => Provider::with_random_id(config.capacity, probe),
    }
}

/// Validate the configuration and assemble a [`LoadBalancer`].
pub fn build_balancer(config: &BalancerConfig) -> Result<LoadBalancer, StartupError> {
    validate_config(config).map_err(ConfigError::Validation)?;

    let providers: Vec<Arc<Provider>> = config
        .providers
        .iter()
        .map(|p| Arc::new(build_provider(p)))
        .collect();

    for p in &providers {
        tracing::info!(provider = %p.id(), capacity = p.capacity(), "Provider registered");
    }

    let pool = ProviderPool::new(providers, build_strategy(config.strategy))?;
    Ok(LoadBalancer::new(pool, config.health_check.clone()))
}
