//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the balancer.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the provider balancer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BalancerConfig {
    /// Selection strategy applied to the active providers.
    pub strategy: StrategyKind,

    /// Provider definitions (1 to 10).
    pub providers: Vec<ProviderConfig>,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for BalancerConfig {
    /// Five simulated providers, each probe succeeding half the time.
    fn default() -> Self {
        let providers = [2, 4, 3, 2, 1]
            .into_iter()
            .map(|capacity| ProviderConfig {
                id: None,
                capacity,
                probe: ProbeConfig::default(),
            })
            .collect();

        Self {
            strategy: StrategyKind::default(),
            providers,
            health_check: HealthCheckConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Provider selection strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Rotate through active providers in order.
    #[default]
    RoundRobin,
    /// Uniform random pick among active providers.
    Random,
}

/// Provider definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Unique provider id. A UUID v4 is generated when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Initial capacity (requests the provider may accept at once).
    #[serde(default = "default_capacity")]
    pub capacity: i64,

    /// Liveness probe used by health checks.
    #[serde(default)]
    pub probe: ProbeConfig,
}

fn default_capacity() -> i64 {
    1
}

/// Simulated liveness probe.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeConfig {
    /// Succeeds with probability `success_rate`.
    Random {
        #[serde(default = "default_success_rate")]
        success_rate: f64,
    },
    /// Always healthy.
    AlwaysUp,
    /// Always failing.
    AlwaysDown,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig::Random {
            success_rate: default_success_rate(),
        }
    }
}

fn default_success_rate() -> f64 {
    0.5
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable the background health-check cycle.
    pub enabled: bool,

    /// Delay before the first cycle, in milliseconds.
    pub initial_delay_ms: u64,

    /// Time between cycles, in milliseconds.
    pub period_ms: u64,
}

impl HealthCheckConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_delay_ms: 100,
            period_ms: 3000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable, for development.
    #[default]
    Pretty,
    /// One JSON object per line, for log aggregation.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: String,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "provider_balancer=info".to_string(),
            log_format: LogFormat::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_demo() {
        let config = BalancerConfig::default();
        let capacities: Vec<i64> = config.providers.iter().map(|p| p.capacity).collect();
        assert_eq!(capacities, [2, 4, 3, 2, 1]);
        assert_eq!(config.strategy, StrategyKind::RoundRobin);
        assert_eq!(config.health_check.initial_delay(), Duration::from_millis(100));
        assert_eq!(config.health_check.period(), Duration::from_millis(3000));
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            strategy = "random"

            [health_check]
            initial_delay_ms = 10
            period_ms = 50

            [observability]
            log_format = "json"

            [[providers]]
            id = "alpha"
            capacity = 3
            probe = { kind = "always_up" }

            [[providers]]
            capacity = 2
            probe = { kind = "random", success_rate = 0.9 }

            [[providers]]
        "#;

        let config: BalancerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.strategy, StrategyKind::Random);
        assert!(config.health_check.enabled);
        assert_eq!(config.health_check.period_ms, 50);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.observability.log_filter, "provider_balancer=info");

        assert_eq!(config.providers.len(), 3);
        assert_eq!(config.providers[0].id.as_deref(), Some("alpha"));
        assert_eq!(config.providers[0].probe, ProbeConfig::AlwaysUp);
        assert_eq!(
            config.providers[1].probe,
            ProbeConfig::Random { success_rate: 0.9 }
        );
        assert_eq!(config.providers[2].capacity, 1);
        assert_eq!(config.providers[2].probe, ProbeConfig::default());
    }
}
