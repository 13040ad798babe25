//! Round-robin selection strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::load_balancer::error::{BalancerError, BalancerResult};
use crate::load_balancer::provider::Provider;
use crate::load_balancer::SelectionStrategy;

/// Round-robin selector.
///
/// Keeps a cursor into the active list. Each call returns the provider under
/// the cursor and advances it modulo the current list length, so a list that
/// shrank since the previous call is re-clamped rather than overrun.
/// The cursor advances whether or not the returned provider has capacity.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionStrategy for RoundRobin {
    fn next_provider(&self, providers: &[Arc<Provider>]) -> BalancerResult<Arc<Provider>> {
        let len = providers.len();
        if len == 0 {
            return Err(BalancerError::NoActiveHosts);
        }

        let index = match self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |i| Some((i % len + 1) % len))
        {
            Ok(previous) | Err(previous) => previous % len,
        };

        Ok(providers[index].clone())
    }

    fn name(&self) -> &'static str {
        "round_robin"
    }
}
