//! Provider liveness probes.
//!
//! A probe answers one question: is this provider able to serve right now?
//! How it finds out (ping, RPC, a flag flipped by a test) is up to the
//! implementation. Probes are invoked from the health-check cycle and are
//! expected to return quickly.

use rand::Rng;

/// A boolean liveness check attached to a provider.
pub trait HealthProbe: Send + Sync {
    /// Return true if the provider is currently healthy.
    fn probe(&self) -> bool;
}

impl HealthProbe for Box<dyn HealthProbe> {
    fn probe(&self) -> bool {
        (**self).probe()
    }
}

/// Simulated probe: succeeds with a fixed probability on every call.
#[derive(Debug, Clone, Copy)]
pub struct RandomProbe {
    success_rate: f64,
}

impl RandomProbe {
    /// Create a probe that succeeds with probability `success_rate`.
    /// Values outside `[0, 1]` are clamped.
    pub fn new(success_rate: f64) -> Self {
        let success_rate = if success_rate.is_nan() {
            0.0
        } else {
            success_rate.clamp(0.0, 1.0)
        };
        Self { success_rate }
    }

    pub fn success_rate(&self) -> f64 {
        self.success_rate
    }
}

impl Default for RandomProbe {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl HealthProbe for RandomProbe {
    fn probe(&self) -> bool {
        rand::thread_rng().gen_bool(self.success_rate)
    }
}

/// Probe that always reports healthy.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysUp;

impl HealthProbe for AlwaysUp {
    fn probe(&self) -> bool {
        true
    }
}

/// Probe that always reports unhealthy.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysDown;

impl HealthProbe for AlwaysDown {
    fn probe(&self) -> bool {
        false
    }
}

/// Adapter turning a closure into a probe.
pub struct FnProbe<F>(F);

impl<F> HealthProbe for FnProbe<F>
where
    F: Fn() -> bool + Send + Sync,
{
    fn probe(&self) -> bool {
        (self.0)()
    }
}

/// Wrap a closure as a [`HealthProbe`].
pub fn probe_fn<F>(f: F) -> FnProbe<F>
where
    F: Fn() -> bool + Send + Sync,
{
    FnProbe(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_fixed_probes() {
        assert!(AlwaysUp.probe());
        assert!(!AlwaysDown.probe());
    }

    #[test]
    fn test_random_probe_extremes() {
        let never = RandomProbe::new(0.0);
        let always = RandomProbe::new(1.0);
        for _ in 0..100 {
            assert!(!never.probe());
            assert!(always.probe());
        }
    }

    #[test]
    fn test_random_probe_clamps() {
        assert_eq!(RandomProbe::new(3.0).success_rate(), 1.0);
        assert_eq!(RandomProbe::new(-1.0).success_rate(), 0.0);
        assert_eq!(RandomProbe::new(f64::NAN).success_rate(), 0.0);
    }

    #[test]
    fn test_closure_probe() {
        let up = Arc::new(AtomicBool::new(true));
        let flag = up.clone();
        let probe = probe_fn(move || flag.load(Ordering::SeqCst));

        assert!(probe.probe());
        up.store(false, Ordering::SeqCst);
        assert!(!probe.probe());
    }
}
