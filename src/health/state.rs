//! Recovery state for excluded providers.
//!
//! # States
//! - Active: provider receives traffic
//! - Excluded(strikes): provider out of rotation, `strikes` consecutive
//!   successful probes observed since exclusion (0 or 1)
//!
//! # State Transitions
//! ```text
//! Active → Excluded(0): probe fails (or manual exclusion)
//! Excluded(0) → Excluded(1): probe succeeds
//! Excluded(1) → Active: probe succeeds
//! Excluded(n) → Excluded(0): probe fails
//! ```

use serde::Serialize;

/// Consecutive successful probes required to bring a provider back.
pub const RECOVERY_THRESHOLD: u8 = 2;

/// Consecutive-success counter for an excluded provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RecoveryStrikes(u8);

/// Outcome of feeding one probe result into [`RecoveryStrikes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Enough consecutive successes; provider goes back to active.
    Recovered,
    /// Success recorded, more needed.
    Pending,
    /// Failure wiped any accumulated progress.
    Reset,
}

impl RecoveryStrikes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u8 {
        self.0
    }

    /// Record a probe result.
    pub fn observe(&mut self, healthy: bool) -> Recovery {
        if !healthy {
            self.0 = 0;
            return Recovery::Reset;
        }
        if self.0 + 1 >= RECOVERY_THRESHOLD {
            Recovery::Recovered
        } else {
            self.0 += 1;
            Recovery::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_consecutive_successes_recover() {
        let mut s = RecoveryStrikes::new();
        assert_eq!(s.observe(true), Recovery::Pending);
        assert_eq!(s.count(), 1);
        assert_eq!(s.observe(true), Recovery::Recovered);
    }

    #[test]
    fn test_failure_resets_progress() {
        let mut s = RecoveryStrikes::new();
        assert_eq!(s.observe(true), Recovery::Pending);
        assert_eq!(s.observe(false), Recovery::Reset);
        assert_eq!(s.count(), 0);
        assert_eq!(s.observe(true), Recovery::Pending);
        assert_eq!(s.observe(true), Recovery::Recovered);
    }
}
