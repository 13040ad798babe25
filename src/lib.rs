//! Client-side provider balancer library.
//!
//! Selects a provider for each logical request, tracks remaining capacity per
//! provider, and keeps failing providers out of rotation until they recover.

pub mod config;
pub mod health;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;

pub use config::schema::BalancerConfig;
pub use lifecycle::Shutdown;
pub use load_balancer::{BalancerError, BalancerResult, LoadBalancer, Provider, ProviderPool};
