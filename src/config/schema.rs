//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files and
//! carry defaults so that a file containing only `endpoints` is valid.

use serde::{Deserialize, Serialize};

/// Root configuration for a cluster client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClusterConfig {
    /// Comma-separated endpoint list, e.g. "http://10.0.0.1:8080,10.0.0.2:8080".
    pub endpoints: String,

    /// Recovery probe settings.
    pub probe: ProbeConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Recovery probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Liveness path, relative to each endpoint.
    pub path: String,

    /// Delay between failed probe attempts in seconds.
    pub interval_secs: u64,

    /// Per-attempt timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            path: "ping".to_string(),
            interval_secs: 5,
            timeout_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level for this crate when RUST_LOG is unset.
    pub log_level: String,

    /// Expose Prometheus metrics.
    pub metrics_enabled: bool,

    /// Metrics listener address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9100".to_string(),
        }
    }
}
