//! Recovery probing for demoted members.
//!
//! # Responsibilities
//! - Issue a liveness GET against a demoted member at a fixed interval
//! - Promote the member back to UP on the first HTTP 200
//!
//! # States
//! ```text
//! PROBING → RECOVERED (terminal, task exits)
//! PROBING → cancelled (shutdown, member stays DOWN)
//! ```
//!
//! # Design Decisions
//! - No retry bound and no backoff: the interval is fixed
//! - Errors, timeouts and non-200 responses all mean "still down"
//! - The cluster lock is only taken for the final status write

use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time;

use crate::cluster::endpoint::Endpoint;
use crate::cluster::tracker::{write_members, Members};
use crate::config::ProbeConfig;
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;

/// Timing and path of recovery probes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbePolicy {
    /// Liveness path relative to the endpoint address.
    pub path: String,
    /// Delay between failed attempts.
    pub interval: Duration,
    /// Per-attempt timeout.
    pub timeout: Duration,
}

impl Default for ProbePolicy {
    fn default() -> Self {
        Self::from(&ProbeConfig::default())
    }
}

impl From<&ProbeConfig> for ProbePolicy {
    fn from(config: &ProbeConfig) -> Self {
        Self {
            path: config.path.clone(),
            interval: Duration::from_secs(config.interval_secs),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[derive(Debug, Error)]
enum ProbeFailure {
    #[error("request failed: {0}")]
    Request(reqwest::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected status {0}")]
    Status(StatusCode),
}

impl ProbeFailure {
    fn label(&self) -> &'static str {
        match self {
            ProbeFailure::Request(_) => "error",
            ProbeFailure::Timeout(_) => "timeout",
            ProbeFailure::Status(_) => "status",
        }
    }
}

/// Issues liveness checks with the injected HTTP client.
#[derive(Debug, Clone)]
pub(crate) struct Prober {
    client: reqwest::Client,
    policy: Arc<ProbePolicy>,
}

impl Prober {
    pub(crate) fn new(client: reqwest::Client, policy: ProbePolicy) -> Self {
        Self {
            client,
            policy: Arc::new(policy),
        }
    }

    pub(crate) fn policy(&self) -> &ProbePolicy {
        &self.policy
    }

    async fn check(&self, url: &str) -> Result<(), ProbeFailure> {
        let request = self
            .client
            .get(url)
            .header("user-agent", "swan-cluster-probe")
            .send();

        let response = time::timeout(self.policy.timeout, request)
            .await
            .map_err(|_| ProbeFailure::Timeout(self.policy.timeout))?
            // the url may carry credentials
            .map_err(|e| ProbeFailure::Request(e.without_url()))?;

        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(ProbeFailure::Status(status)),
        }
    }
}

/// Background task bringing one demoted member back.
pub(crate) struct RecoveryProbe {
    index: usize,
    endpoint: Endpoint,
    members: Members,
    prober: Prober,
    shutdown: ShutdownSignal,
}

impl RecoveryProbe {
    pub(crate) fn new(
        index: usize,
        endpoint: Endpoint,
        members: Members,
        prober: Prober,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            index,
            endpoint,
            members,
            prober,
            shutdown,
        }
    }

    pub(crate) async fn run(mut self) {
        let url = self.endpoint.probe_url(&self.prober.policy().path);
        let interval = self.prober.policy().interval;
        // credentials stay out of logs and metric labels
        let address = self.endpoint.label().to_string();

        tracing::debug!(endpoint = %address, path = %self.prober.policy().path, "Recovery probe started");

        let mut attempts: u64 = 0;
        loop {
            attempts += 1;
            let outcome = tokio::select! {
                outcome = self.prober.check(&url) => outcome,
                _ = self.shutdown.recv() => {
                    tracing::info!(endpoint = %address, attempts, "Recovery probe cancelled by shutdown");
                    return;
                }
            };

            match outcome {
                Ok(()) => {
                    metrics::record_probe_attempt(&address, "success");
                    break;
                }
                Err(e) => {
                    metrics::record_probe_attempt(&address, e.label());
                    tracing::debug!(endpoint = %address, attempts, error = %e, "Member still down");
                }
            }

            tokio::select! {
                _ = time::sleep(interval) => {}
                _ = self.shutdown.recv() => {
                    tracing::info!(endpoint = %address, attempts, "Recovery probe cancelled by shutdown");
                    return;
                }
            }
        }

        self.recover(&address, attempts);
    }

    fn recover(&self, address: &str, attempts: u64) {
        let mut members = write_members(&self.members);
        let Some(member) = members.get_mut(self.index) else {
            return;
        };
        if member.mark_up() {
            tracing::info!(endpoint = %address, attempts, "Member recovered, marking up");
            metrics::record_recovery(address);
            let up = members.iter().filter(|m| m.is_up()).count();
            metrics::record_membership(up, members.len() - up);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_config() {
        let policy = ProbePolicy::from(&ProbeConfig {
            path: "v2/ping".into(),
            interval_secs: 3,
            timeout_secs: 1,
        });
        assert_eq!(policy.path, "v2/ping");
        assert_eq!(policy.interval, Duration::from_secs(3));
        assert_eq!(policy.timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_default_policy() {
        let policy = ProbePolicy::default();
        assert_eq!(policy.path, "ping");
        assert_eq!(policy.interval, Duration::from_secs(5));
    }

    #[test]
    fn test_failure_labels() {
        assert_eq!(ProbeFailure::Timeout(Duration::from_secs(1)).label(), "timeout");
        assert_eq!(ProbeFailure::Status(StatusCode::SERVICE_UNAVAILABLE).label(), "status");
        assert_eq!(
            ProbeFailure::Status(StatusCode::SERVICE_UNAVAILABLE).to_string(),
            "unexpected status 503 Service Unavailable"
        );
    }
}
