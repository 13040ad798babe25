//! Shared utilities for integration and load testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use provider_balancer::health::probe::probe_fn;
use provider_balancer::Provider;

/// A provider whose probe result is controlled by a shared flag.
pub fn switchable_provider(id: &str, capacity: i64) -> (Arc<Provider>, Arc<AtomicBool>) {
    let healthy = Arc::new(AtomicBool::new(true));
    let flag = healthy.clone();
    let provider = Provider::new(id, capacity, probe_fn(move || flag.load(Ordering::SeqCst)));
    (Arc::new(provider), healthy)
}

/// A provider whose probe replays a fixed script, then reports healthy.
#[allow(dead_code)]
pub fn scripted_provider(id: &str, capacity: i64, script: &[bool]) -> Arc<Provider> {
    let queue = Mutex::new(script.iter().copied().collect::<VecDeque<_>>());
    let provider = Provider::new(
        id,
        capacity,
        probe_fn(move || queue.lock().unwrap().pop_front().unwrap_or(true)),
    );
    Arc::new(provider)
}
