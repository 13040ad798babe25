//! Metrics collection.
//!
//! # Metrics
//! - `balancer_selections_total` (counter): successful selections by strategy
//! - `balancer_selection_errors_total` (counter): failed selections by error kind
//! - `balancer_provider_active` (gauge): 1=active, 0=excluded
//! - `balancer_provider_capacity` (gauge): remaining capacity per provider

pub const SELECTIONS_TOTAL: &str = "balancer_selections_total";
pub const SELECTION_ERRORS_TOTAL: &str = "balancer_selection_errors_total";
pub const PROVIDER_ACTIVE: &str = "balancer_provider_active";
pub const PROVIDER_CAPACITY: &str = "balancer_provider_capacity";

pub fn record_selection(strategy: &'static str) {
    metrics::counter!(SELECTIONS_TOTAL, "strategy" => strategy).increment(1);
}

pub fn record_selection_error(kind: &'static str) {
    metrics::counter!(SELECTION_ERRORS_TOTAL, "kind" => kind).increment(1);
}

pub fn record_provider_health(provider: &str, active: bool) {
    metrics::gauge!(PROVIDER_ACTIVE, "provider" => provider.to_string())
        .set(if active { 1.0 } else { 0.0 });
}

pub fn record_provider_capacity(provider: &str, capacity: i64) {
    metrics::gauge!(PROVIDER_CAPACITY, "provider" => provider.to_string()).set(capacity as f64);
}
