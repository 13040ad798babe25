//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! LoadBalancer::get()
//!     → pool.rs (admission check under read lock)
//!     → Apply selection strategy:
//!         - round_robin.rs (rotate through active providers)
//!         - random.rs (uniform pick)
//!     → provider.rs (take a capacity slot, forward request)
//!     → Slot returned, provider id handed back to caller
//! ```
//!
//! # Design Decisions
//! - Strategies are pure policy over the active list; admission lives in the pool
//! - Active and excluded collections share one read/write lock
//! - Capacity counters are per-provider atomics, updated without the pool lock

use std::fmt;
use std::sync::Arc;

use crate::config::StrategyKind;

pub mod balancer;
pub mod error;
pub mod pool;
pub mod provider;
pub mod random;
pub mod round_robin;

pub use balancer::LoadBalancer;
pub use error::{BalancerError, BalancerResult};
pub use pool::ProviderPool;
pub use provider::Provider;

/// A provider selection policy.
pub trait SelectionStrategy: Send + Sync + fmt::Debug {
    /// Pick one provider from the ordered active list.
    ///
    /// Fails with [`BalancerError::NoActiveHosts`] when the list is empty.
    fn next_provider(&self, providers: &[Arc<Provider>]) -> BalancerResult<Arc<Provider>>;

    /// Strategy name for logs and metrics.
    fn name(&self) -> &'static str;
}

/// Instantiate the strategy selected in configuration.
pub fn build_strategy(kind: StrategyKind) -> Box<dyn SelectionStrategy> {
    match kind {
        StrategyKind::RoundRobin => Box::new(round_robin::RoundRobin::new()),
        StrategyKind::Random => Box::new(random::RandomSelection::new()),
    }
}
