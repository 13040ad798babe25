//! Provider pool management.
//!
//! # Responsibilities
//! - Own the active list and the excluded set
//! - Run the two-pass health-check cycle
//! - Manual exclusion and inclusion by id
//! - Admission control ahead of strategy selection
//! - Capacity leases that hand slots back when a request completes

use std::collections::HashSet;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::health::state::{Recovery, RecoveryStrikes};
use crate::load_balancer::{
    error::{BalancerError, BalancerResult},
    provider::Provider,
    SelectionStrategy,
};

/// Smallest pool accepted at construction.
pub const MIN_PROVIDERS: usize = 1;
/// Largest pool accepted at construction.
pub const MAX_PROVIDERS: usize = 10;

#[derive(Debug)]
struct ExcludedProvider {
    provider: Arc<Provider>,
    strikes: RecoveryStrikes,
}

/// Active and excluded collections. Every provider lives in exactly one.
#[derive(Debug, Default)]
struct PoolState {
    active: Vec<Arc<Provider>>,
    excluded: Vec<ExcludedProvider>,
}

impl PoolState {
    fn active_position(&self, id: &str) -> Option<usize> {
        self.active.iter().position(|p| p.id() == id)
    }

    fn excluded_position(&self, id: &str) -> Option<usize> {
        self.excluded.iter().position(|e| e.provider.id() == id)
    }

    fn exclude_at(&mut self, pos: usize) -> Arc<Provider> {
        let provider = self.active.remove(pos);
        self.excluded.push(ExcludedProvider {
            provider: provider.clone(),
            strikes: RecoveryStrikes::new(),
        });
        provider
    }

    fn include_at(&mut self, pos: usize) -> Arc<Provider> {
        let entry = self.excluded.remove(pos);
        self.active.push(entry.provider.clone());
        entry.provider
    }

    fn has_acceptable_capacity(&self) -> bool {
        self.active.iter().any(|p| p.has_capacity())
    }
}

/// Providers moved during one health-check cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Number of probe calls made.
    pub probed: usize,
    /// Providers moved from active to excluded.
    pub excluded: Vec<String>,
    /// Providers promoted back to active.
    pub recovered: Vec<String>,
}

impl CycleReport {
    pub fn is_quiet(&self) -> bool {
        self.excluded.is_empty() && self.recovered.is_empty()
    }
}

/// Point-in-time view of one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderStatus {
    pub id: String,
    pub capacity: i64,
    /// Recovery strikes; only present for excluded providers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strikes: Option<u8>,
}

/// Point-in-time view of the whole pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolSnapshot {
    pub strategy: &'static str,
    pub active: Vec<ProviderStatus>,
    pub excluded: Vec<ProviderStatus>,
}

/// Owns the providers and the selection strategy.
#[derive(Debug)]
pub struct ProviderPool {
    state: RwLock<PoolState>,
    strategy: Box<dyn SelectionStrategy>,
}

impl ProviderPool {
    /// Build a pool. All providers start active.
    ///
    /// Fails with [`BalancerError::InvalidPoolSize`] unless the count is within
    /// [`MIN_PROVIDERS`]..=[`MAX_PROVIDERS`], and with
    /// [`BalancerError::DuplicateProvider`] if two providers share an id.
    pub fn new(
        providers: Vec<Arc<Provider>>,
        strategy: Box<dyn SelectionStrategy>,
    ) -> BalancerResult<Self> {
        if !(MIN_PROVIDERS..=MAX_PROVIDERS).contains(&providers.len()) {
            return Err(BalancerError::InvalidPoolSize(providers.len()));
        }

        let mut seen = HashSet::new();
        for p in &providers {
            if !seen.insert(p.id()) {
                return Err(BalancerError::DuplicateProvider(p.id().to_string()));
            }
        }

        tracing::debug!(
            providers = providers.len(),
            strategy = strategy.name(),
            "Provider pool created"
        );

        Ok(Self {
            state: RwLock::new(PoolState {
                active: providers,
                excluded: Vec::new(),
            }),
            strategy,
        })
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Total number of providers, active and excluded.
    pub fn len(&self) -> usize {
        let state = self.state.read();
        state.active.len() + state.excluded.len()
    }

    /// Always false once construction succeeded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True iff at least one active provider has capacity left.
    pub fn has_acceptable_capacity(&self) -> bool {
        self.state.read().has_acceptable_capacity()
    }

    /// Select the next provider.
    ///
    /// Admission is checked against the whole active list; the strategy may
    /// still return a provider that is itself at zero capacity.
    pub fn next_provider(&self) -> BalancerResult<Arc<Provider>> {
        let state = self.state.read();
        if state.active.is_empty() {
            return Err(BalancerError::NoActiveHosts);
        }
        if !state.has_acceptable_capacity() {
            return Err(BalancerError::AllHostsBusy);
        }
        self.strategy.next_provider(&state.active)
    }

    /// Select a provider and take one slot of its capacity.
    ///
    /// The slot is returned when the lease is dropped.
    pub fn acquire(&self) -> BalancerResult<CapacityLease<'_>> {
        let provider = self.next_provider()?;
        provider.decrement_capacity();
        Ok(CapacityLease {
            pool: self,
            provider,
        })
    }

    /// Move an active provider to the excluded set.
    pub fn exclude_by_id(&self, id: &str) -> BalancerResult<()> {
        let mut state = self.state.write();
        let pos = state
            .active_position(id)
            .ok_or_else(|| BalancerError::ProviderNotFound(id.to_string()))?;
        state.exclude_at(pos);
        tracing::info!(provider = %id, "Provider excluded manually");
        Ok(())
    }

    /// Move an excluded provider back to the end of the active list.
    pub fn include_by_id(&self, id: &str) -> BalancerResult<()> {
        let mut state = self.state.write();
        let pos = state
            .excluded_position(id)
            .ok_or_else(|| BalancerError::ProviderNotFound(id.to_string()))?;
        state.include_at(pos);
        tracing::info!(provider = %id, "Provider included manually");
        Ok(())
    }

    /// Give one slot back to an active provider.
    ///
    /// Excluded or unknown ids are ignored; returns whether the provider was found.
    pub fn increment_capacity_by_id(&self, id: &str) -> bool {
        let state = self.state.read();
        match state.active.iter().find(|p| p.id() == id) {
            Some(p) => {
                p.increment_capacity();
                true
            }
            None => {
                tracing::debug!(provider = %id, "Capacity increment skipped: provider not active");
                false
            }
        }
    }

    /// Run one health-check cycle.
    ///
    /// First every active provider is probed and failures are excluded with
    /// zero strikes. Then every excluded provider is probed: two consecutive
    /// successes bring it back, any failure resets its progress.
    ///
    /// Probes run without the pool lock held; each migration re-checks
    /// membership under the write lock, so concurrent manual moves are never
    /// undone or duplicated.
    pub fn run_health_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();

        let active: Vec<Arc<Provider>> = self.state.read().active.clone();
        for provider in active {
            report.probed += 1;
            if provider.probe() {
                continue;
            }
            let mut state = self.state.write();
            if let Some(pos) = state.active.iter().position(|p| Arc::ptr_eq(p, &provider)) {
                state.exclude_at(pos);
                tracing::warn!(provider = %provider.id(), "Health check failed, provider excluded");
                report.excluded.push(provider.id().to_string());
            }
        }

        let excluded: Vec<Arc<Provider>> = self
            .state
            .read()
            .excluded
            .iter()
            .map(|e| e.provider.clone())
            .collect();
        for provider in excluded {
            report.probed += 1;
            let healthy = provider.probe();

            let mut state = self.state.write();
            let Some(pos) = state
                .excluded
                .iter()
                .position(|e| Arc::ptr_eq(&e.provider, &provider))
            else {
                continue;
            };

            match state.excluded[pos].strikes.observe(healthy) {
                Recovery::Recovered => {
                    state.include_at(pos);
                    tracing::info!(provider = %provider.id(), "Provider recovered, back in rotation");
                    report.recovered.push(provider.id().to_string());
                }
                Recovery::Pending => {
                    tracing::debug!(provider = %provider.id(), "Excluded provider passed probe");
                }
                Recovery::Reset => {
                    tracing::trace!(provider = %provider.id(), "Excluded provider still failing");
                }
            }
        }

        report
    }

    /// Ids of active providers, in selection order.
    pub fn active_ids(&self) -> Vec<String> {
        self.state
            .read()
            .active
            .iter()
            .map(|p| p.id().to_string())
            .collect()
    }

    /// Ids of excluded providers, in exclusion order.
    pub fn excluded_ids(&self) -> Vec<String> {
        self.state
            .read()
            .excluded
            .iter()
            .map(|e| e.provider.id().to_string())
            .collect()
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.state.read().active_position(id).is_some()
    }

    pub fn is_excluded(&self, id: &str) -> bool {
        self.state.read().excluded_position(id).is_some()
    }

    /// Recovery strikes of an excluded provider.
    pub fn strikes(&self, id: &str) -> Option<u8> {
        let state = self.state.read();
        state
            .excluded_position(id)
            .map(|pos| state.excluded[pos].strikes.count())
    }

    /// Look a provider up by id in either collection.
    pub fn provider(&self, id: &str) -> Option<Arc<Provider>> {
        let state = self.state.read();
        state
            .active
            .iter()
            .find(|p| p.id() == id)
            .or_else(|| {
                state
                    .excluded
                    .iter()
                    .map(|e| &e.provider)
                    .find(|p| p.id() == id)
            })
            .cloned()
    }

    /// All providers, active first.
    pub fn all_providers(&self) -> Vec<Arc<Provider>> {
        let state = self.state.read();
        state
            .active
            .iter()
            .cloned()
            .chain(state.excluded.iter().map(|e| e.provider.clone()))
            .collect()
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        let state = self.state.read();
        PoolSnapshot {
            strategy: self.strategy.name(),
            active: state
                .active
                .iter()
                .map(|p| ProviderStatus {
                    id: p.id().to_string(),
                    capacity: p.capacity(),
                    strikes: None,
                })
                .collect(),
            excluded: state
                .excluded
                .iter()
                .map(|e| ProviderStatus {
                    id: e.provider.id().to_string(),
                    capacity: e.provider.capacity(),
                    strikes: Some(e.strikes.count()),
                })
                .collect(),
        }
    }
}

/// One slot of a provider's capacity, held for the duration of a request.
#[derive(Debug)]
pub struct CapacityLease<'a> {
    pool: &'a ProviderPool,
    provider: Arc<Provider>,
}

impl CapacityLease<'_> {
    pub fn provider(&self) -> &Arc<Provider> {
        &self.provider
    }
}

impl Deref for CapacityLease<'_> {
    type Target = Provider;
    fn deref(&self) -> &Self::Target {
        &self.provider
    }
}

impl Drop for CapacityLease<'_> {
    fn drop(&mut self) {
        // Excluded while in flight: the pool no longer reaches it by id
        if !self.pool.increment_capacity_by_id(self.provider.id()) {
            self.provider.increment_capacity();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::probe::{probe_fn, AlwaysUp};
    use crate::load_balancer::{random::RandomSelection, round_robin::RoundRobin};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};
    use parking_lot::Mutex;

    fn up(id: &str, capacity: i64) -> Arc<Provider> {
        Arc::new(Provider::new(id, capacity, AlwaysUp))
    }

    fn flagged(id: &str, capacity: i64) -> (Arc<Provider>, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(true));
        let f = flag.clone();
        let p = Arc::new(Provider::new(id, capacity, probe_fn(move || f.load(Ordering::SeqCst))));
        (p, flag)
    }

    fn scripted(id: &str, script: &[bool]) -> Arc<Provider> {
        let queue = Mutex::new(script.iter().copied().collect::<VecDeque<_>>());
        Arc::new(Provider::new(
            id,
            1,
            probe_fn(move || queue.lock().pop_front().unwrap_or(true)),
        ))
    }

    fn rr_pool(providers: Vec<Arc<Provider>>) -> ProviderPool {
        ProviderPool::new(providers, Box::new(RoundRobin::new())).unwrap()
    }

    fn assert_partitioned(pool: &ProviderPool, all: &[&str]) {
        let active = pool.active_ids();
        let excluded = pool.excluded_ids();
        for id in &active {
            assert!(!excluded.contains(id), "{id} is both active and excluded");
        }
        let mut union: Vec<String> = active.into_iter().chain(excluded).collect();
        union.sort();
        let mut expected: Vec<String> = all.iter().map(|s| s.to_string()).collect();
        expected.sort();
        assert_eq!(union, expected);
    }

    #[test]
    fn test_pool_size_bounds() {
        let err = ProviderPool::new(vec![], Box::new(RoundRobin::new())).unwrap_err();
        assert_eq!(err, BalancerError::InvalidPoolSize(0));

        let eleven: Vec<_> = (0..11).map(|i| up(&format!("p{i}"), 1)).collect();
        let err = ProviderPool::new(eleven, Box::new(RoundRobin::new())).unwrap_err();
        assert_eq!(err, BalancerError::InvalidPoolSize(11));

        for n in MIN_PROVIDERS..=MAX_PROVIDERS {
            let list: Vec<_> = (0..n).map(|i| up(&format!("p{i}"), 1)).collect();
            let pool = ProviderPool::new(list, Box::new(RandomSelection::new())).unwrap();
            assert_eq!(pool.active_ids().len(), n);
            assert!(pool.excluded_ids().is_empty());
        }
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = ProviderPool::new(vec![up("a", 1), up("a", 2)], Box::new(RoundRobin::new()))
            .unwrap_err();
        assert_eq!(err, BalancerError::DuplicateProvider("a".into()));
    }

    #[test]
    fn test_round_robin_cycles_in_order() {
        let pool = rr_pool(vec![up("a", 1), up("b", 1), up("c", 1)]);
        let ids: Vec<String> = (0..6)
            .map(|_| pool.next_provider().unwrap().id().to_string())
            .collect();
        assert_eq!(ids, ["a", "b", "c", "a", "b", "c"]);
    }

    #[test]
    fn test_admission_control() {
        let pool = rr_pool(vec![up("a", 0), up("b", 0)]);
        assert!(!pool.has_acceptable_capacity());
        assert_eq!(pool.next_provider().unwrap_err(), BalancerError::AllHostsBusy);

        pool.provider("b").unwrap().increment_capacity();
        assert!(pool.has_acceptable_capacity());
        assert!(pool.next_provider().is_ok());
    }

    #[test]
    fn test_admission_is_advisory_for_round_robin() {
        let pool = rr_pool(vec![up("a", 0), up("b", 1)]);
        // "a" sits at zero but "b" admits the request
        assert_eq!(pool.next_provider().unwrap().id(), "a");
        assert_eq!(pool.next_provider().unwrap().id(), "b");
    }

    #[test]
    fn test_no_active_hosts() {
        let pool = rr_pool(vec![up("a", 1)]);
        pool.exclude_by_id("a").unwrap();
        assert_eq!(pool.next_provider().unwrap_err(), BalancerError::NoActiveHosts);
    }

    #[test]
    fn test_manual_exclude_include_pairing() {
        let pool = rr_pool(vec![up("a", 1), up("b", 1)]);

        pool.exclude_by_id("a").unwrap();
        assert_eq!(pool.strikes("a"), Some(0));
        assert_eq!(
            pool.exclude_by_id("a").unwrap_err(),
            BalancerError::ProviderNotFound("a".into())
        );

        pool.include_by_id("a").unwrap();
        assert_eq!(
            pool.include_by_id("a").unwrap_err(),
            BalancerError::ProviderNotFound("a".into())
        );
        assert_eq!(pool.active_ids(), ["b", "a"]);

        assert!(pool.exclude_by_id("zzz").is_err());
        assert!(pool.include_by_id("zzz").is_err());
        assert_partitioned(&pool, &["a", "b"]);
    }

    #[test]
    fn test_increment_capacity_by_id_ignores_excluded() {
        let pool = rr_pool(vec![up("a", 1), up("b", 1)]);
        assert!(pool.increment_capacity_by_id("a"));
        assert_eq!(pool.provider("a").unwrap().capacity(), 2);

        pool.exclude_by_id("b").unwrap();
        assert!(!pool.increment_capacity_by_id("b"));
        assert!(!pool.increment_capacity_by_id("unknown"));
        assert_eq!(pool.provider("b").unwrap().capacity(), 1);
    }

    #[test]
    fn test_health_cycle_excludes_failures() {
        let (a, a_up) = flagged("a", 1);
        let (b, _) = flagged("b", 1);
        let (c, c_up) = flagged("c", 1);
        let pool = rr_pool(vec![a, b, c]);

        a_up.store(false, Ordering::SeqCst);
        c_up.store(false, Ordering::SeqCst);
        let report = pool.run_health_cycle();

        assert_eq!(report.excluded, ["a", "c"]);
        assert!(report.recovered.is_empty());
        assert_eq!(pool.active_ids(), ["b"]);
        // Newly excluded providers are probed again in the same cycle
        assert_eq!(report.probed, 5);
        assert_partitioned(&pool, &["a", "b", "c"]);
    }

    #[test]
    fn test_recovery_requires_consecutive_successes() {
        // Cycle 1: active scan fails, excluded scan fails
        // Cycle 2: success (strike 1)
        // Cycle 3: failure (strike 0)
        // Cycle 4: success (strike 1)
        // Cycle 5: success -> active
        let p = scripted("a", &[false, false, true, false, true, true]);
        let pool = rr_pool(vec![p, up("b", 1)]);

        pool.run_health_cycle();
        assert_eq!(pool.strikes("a"), Some(0));

        pool.run_health_cycle();
        assert_eq!(pool.strikes("a"), Some(1));

        pool.run_health_cycle();
        assert_eq!(pool.strikes("a"), Some(0));

        pool.run_health_cycle();
        assert_eq!(pool.strikes("a"), Some(1));
        assert!(pool.is_excluded("a"));

        let report = pool.run_health_cycle();
        assert_eq!(report.recovered, ["a"]);
        assert!(pool.is_active("a"));
        assert_eq!(pool.active_ids(), ["b", "a"]);
    }

    #[test]
    fn test_acquire_lease_restores_capacity() {
        let pool = rr_pool(vec![up("a", 1), up("b", 1)]);
        {
            let lease = pool.acquire().unwrap();
            assert_eq!(lease.id(), "a");
            assert_eq!(lease.capacity(), 0);
        }
        assert_eq!(pool.provider("a").unwrap().capacity(), 1);
    }

    #[test]
    fn test_lease_restores_capacity_after_exclusion() {
        let pool = rr_pool(vec![up("a", 1), up("b", 1)]);
        let lease = pool.acquire().unwrap();
        pool.exclude_by_id("a").unwrap();
        drop(lease);
        assert_eq!(pool.provider("a").unwrap().capacity(), 1);
    }

    #[test]
    fn test_snapshot() {
        let pool = rr_pool(vec![up("a", 2), up("b", 3)]);
        pool.exclude_by_id("b").unwrap();

        let snap = pool.snapshot();
        assert_eq!(snap.strategy, "round_robin");
        assert_eq!(
            snap.active,
            vec![ProviderStatus { id: "a".into(), capacity: 2, strikes: None }]
        );
        assert_eq!(
            snap.excluded,
            vec![ProviderStatus { id: "b".into(), capacity: 3, strikes: Some(0) }]
        );
    }

    #[test]
    fn test_concurrent_migrations_keep_partition() {
        let pool = Arc::new(rr_pool(vec![up("a", 5), up("b", 5), up("c", 5)]));

        let movers: Vec<_> = ["a", "b"]
            .into_iter()
            .map(|id| {
                let pool = pool.clone();
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        let _ = pool.exclude_by_id(id);
                        let _ = pool.include_by_id(id);
                    }
                })
            })
            .collect();
        let selector = {
            let pool = pool.clone();
            std::thread::spawn(move || {
                for _ in 0..2000 {
                    if let Ok(lease) = pool.acquire() {
                        assert!(!lease.id().is_empty());
                    }
                }
            })
        };

        for h in movers {
            h.join().unwrap();
        }
        selector.join().unwrap();

        assert_partitioned(&pool, &["a", "b", "c"]);
        for p in pool.all_providers() {
            assert_eq!(p.capacity(), 5);
        }
    }
}
