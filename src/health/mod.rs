//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Initial delay, then fixed-period timer
//!     → pool.run_health_cycle()
//!         → probe active providers, exclude failures
//!         → probe excluded providers, feed state.rs
//!     → record per-provider gauges
//!
//! Recovery state machine (state.rs):
//!     Excluded(0) → Excluded(1) → Active
//!     Any failure resets to Excluded(0)
//! ```
//!
//! # Design Decisions
//! - Probe failure is signal, never an error
//! - Recovery requires consecutive successes to prevent flapping
//! - The monitor is an owned task with explicit shutdown

pub mod active;
pub mod probe;
pub mod state;

pub use probe::{AlwaysDown, AlwaysUp, HealthProbe, RandomProbe};
