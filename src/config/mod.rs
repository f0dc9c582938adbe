/// Configuration for the control plane
///
/// Holds the two timing contracts the lock manager operates under. Values
/// can be overridden through environment variables for container deployment.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main control-plane configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Lock timing configuration
    pub lock: LockConfig,
}

/// Advisory-lock timing contracts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// How long a lock survives without a heartbeat before any reader may
    /// reap it and acquire for themselves (default: 120s)
    pub lock_timeout: Duration,
    /// How long a takeover request may sit unanswered before the next read
    /// forces the swap to the requester (default: 60s)
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lock: LockConfig::default(),
        }
    }
}

impl Default for LockConfig {
    /// Default timeouts with ENV_VAR support for k8s/container deployment
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(env_secs("LOOMWAY_LOCK_TIMEOUT_SECS", 120)),
            request_timeout: Duration::from_secs(env_secs("LOOMWAY_REQUEST_TIMEOUT_SECS", 60)),
        }
    }
}

fn env_secs(var: &str, default: u64) -> u64 {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_timing_contracts() {
        let config = LockConfig::default();
        assert_eq!(config.lock_timeout, Duration::from_secs(120));
        assert_eq!(config.request_timeout, Duration::from_secs(60));
    }
}
