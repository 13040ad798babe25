//! Random selection strategy.

use std::sync::Arc;

use rand::Rng;

use crate::load_balancer::error::{BalancerError, BalancerResult};
use crate::load_balancer::provider::Provider;
use crate::load_balancer::SelectionStrategy;

/// Uniform random selector. Stateless; no fairness or capacity weighting.
#[derive(Debug, Default)]
pub struct RandomSelection;

impl RandomSelection {
    pub fn new() -> Self {
        Self
    }
}

impl SelectionStrategy for RandomSelection {
    fn next_provider(&self, providers: &[Arc<Provider>]) -> BalancerResult<Arc<Provider>> {
        if providers.is_empty() {
            return Err(BalancerError::NoActiveHosts);
        }
        let idx = rand::thread_rng().gen_range(0..providers.len());
        Ok(providers[idx].clone())
    }

    fn name(&self) -> &'static str {
        "random"
    }
}
