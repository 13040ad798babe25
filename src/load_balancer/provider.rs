//! Provider abstraction.
//!
//! # Responsibilities
//! - Represent a single unit of backend capacity
//! - Track remaining capacity with an atomic counter
//! - Carry the liveness probe used by the health-check cycle

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use uuid::Uuid;

use crate::health::probe::HealthProbe;

/// A single backend provider.
///
/// Identity is fixed at construction. Capacity is the number of requests the
/// provider may currently accept; it is adjusted concurrently and has no
/// enforced lower bound.
pub struct Provider {
    id: String,
    capacity: AtomicI64,
    probe: Box<dyn HealthProbe>,
}

impl Provider {
    /// Create a provider with an explicit id.
    pub fn new<P>(id: impl Into<String>, capacity: i64, probe: P) -> Self
    where
        P: HealthProbe + 'static,
    {
        Self {
            id: id.into(),
            capacity: AtomicI64::new(capacity),
            probe: Box::new(probe),
        }
    }

    /// Create a provider identified by a fresh UUID v4.
    pub fn with_random_id<P>(capacity: i64, probe: P) -> Self
    where
        P: HealthProbe + 'static,
    {
        Self::new(Uuid::new_v4().to_string(), capacity, probe)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current remaining capacity.
    pub fn capacity(&self) -> i64 {
        self.capacity.load(Ordering::Acquire)
    }

    pub fn has_capacity(&self) -> bool {
        self.capacity() > 0
    }

    /// Take one slot. Returns the capacity after the change.
    pub fn decrement_capacity(&self) -> i64 {
        self.capacity.fetch_sub(1, Ordering::AcqRel) - 1
    }

    /// Give one slot back. Returns the capacity after the change.
    pub fn increment_capacity(&self) -> i64 {
        self.capacity.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Run the liveness probe.
    pub fn probe(&self) -> bool {
        self.probe.probe()
    }

    /// Forward the (empty) request: the provider answers with its id.
    pub fn identify(&self) -> String {
        tracing::trace!(provider = %self.id, "Request forwarded");
        self.id.clone()
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("id", &self.id)
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}
