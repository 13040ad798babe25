//! Load balancer error types.

use thiserror::Error;

use crate::load_balancer::pool::{MAX_PROVIDERS, MIN_PROVIDERS};

/// Errors surfaced by the pool and the load balancer façade.
///
/// None of these are retried internally; retry policy belongs to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BalancerError {
    /// Pool constructed with a provider count outside the allowed range.
    #[error("invalid pool size {0}: expected between {min} and {max} providers", min = MIN_PROVIDERS, max = MAX_PROVIDERS)]
    InvalidPoolSize(usize),

    /// Two providers share the same id.
    #[error("duplicate provider id '{0}'")]
    DuplicateProvider(String),

    /// Manual exclude/include on an id not in the expected set.
    #[error("provider '{0}' not found")]
    ProviderNotFound(String),

    /// Selection found no active providers.
    #[error("no hosts active, please try later")]
    NoActiveHosts,

    /// Every active provider is at zero capacity.
    #[error("all hosts busy, please try later")]
    AllHostsBusy,
}

impl BalancerError {
    /// Short, stable label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            BalancerError::InvalidPoolSize(_) => "invalid_pool_size",
            BalancerError::DuplicateProvider(_) => "duplicate_provider",
            BalancerError::ProviderNotFound(_) => "provider_not_found",
            BalancerError::NoActiveHosts => "no_active_hosts",
            BalancerError::AllHostsBusy => "all_hosts_busy",
        }
    }

    /// True for errors the caller may resolve by trying again later.
    pub fn is_transient(&self) -> bool {
        matches!(self, BalancerError::NoActiveHosts | BalancerError::AllHostsBusy)
    }
}

/// Result type for load balancer operations.
pub type BalancerResult<T> = Result<T, BalancerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            BalancerError::InvalidPoolSize(11).to_string(),
            "invalid pool size 11: expected between 1 and 10 providers"
        );
        assert_eq!(
            BalancerError::ProviderNotFound("p1".into()).to_string(),
            "provider 'p1' not found"
        );
    }

    #[test]
    fn test_transient_kinds() {
        assert!(BalancerError::AllHostsBusy.is_transient());
        assert!(BalancerError::NoActiveHosts.is_transient());
        assert!(!BalancerError::ProviderNotFound("x".into()).is_transient());
        assert_eq!(BalancerError::AllHostsBusy.kind(), "all_hosts_busy");
    }
}
