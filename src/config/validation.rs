//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Enforce pool size bounds before any provider is built
//! - Validate value ranges (period > 0, capacity >= 0, probabilities in [0, 1])
//! - Detect duplicate provider ids
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BalancerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::{BalancerConfig, ProbeConfig};
use crate::load_balancer::pool::{MAX_PROVIDERS, MIN_PROVIDERS};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("expected between {min} and {max} providers, got {0}", min = MIN_PROVIDERS, max = MAX_PROVIDERS)]
    ProviderCount(usize),

    #[error("provider #{0} has an empty id")]
    EmptyProviderId(usize),

    #[error("duplicate provider id '{0}'")]
    DuplicateProviderId(String),

    #[error("provider #{index} has negative capacity {capacity}")]
    NegativeCapacity { index: usize, capacity: i64 },

    #[error("provider #{index} probe success_rate {rate} is outside [0, 1]")]
    SuccessRate { index: usize, rate: f64 },

    #[error("health_check.period_ms must be greater than zero")]
    ZeroPeriod,
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let count = config.providers.len();
    if !(MIN_PROVIDERS..=MAX_PROVIDERS).contains(&count) {
        errors.push(ValidationError::ProviderCount(count));
    }

    let mut seen = HashSet::new();
    for (index, provider) in config.providers.iter().enumerate() {
        if let Some(id) = &provider.id {
            if id.trim().is_empty() {
                errors.push(ValidationError::EmptyProviderId(index));
            } else if !seen.insert(id.as_str()) {
                errors.push(ValidationError::DuplicateProviderId(id.clone()));
            }
        }

        if provider.capacity < 0 {
            errors.push(ValidationError::NegativeCapacity {
                index,
                capacity: provider.capacity,
            });
        }

        if let ProbeConfig::Random { success_rate } = provider.probe {
            if !(0.0..=1.0).contains(&success_rate) {
                errors.push(ValidationError::SuccessRate {
                    index,
                    rate: success_rate,
                });
            }
        }
    }

    if config.health_check.period_ms == 0 {
        errors.push(ValidationError::ZeroPeriod);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
