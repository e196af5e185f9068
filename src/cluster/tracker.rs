//! Membership tracker.
//!
//! # Responsibilities
//! - Own every member and its status behind a single RwLock
//! - Hand out the first UP member to callers
//! - Demote members on reported failure and start their recovery probe
//! - Track probe tasks so shutdown can cancel and join them
//!
//! # Design Decisions
//! - `select` and `demote` never await; they only take the in-memory lock
//! - Only the caller that wins the UP → DOWN transition spawns a probe
//! - Probes hold the member list, not the cluster, so dropping the cluster
//!   aborts them instead of leaking them

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinSet};

use crate::cluster::endpoint::{parse_endpoints, Endpoint};
use crate::cluster::error::ClusterError;
use crate::cluster::member::{Member, MemberSnapshot, MemberStatus};
use crate::cluster::probe::{Prober, ProbePolicy, RecoveryProbe};
use crate::config::{validate_config, ClusterConfig};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

pub(crate) type Members = Arc<RwLock<Vec<Member>>>;

// A panic while holding the lock cannot leave a half-written status, so
// poisoning is ignored.
pub(crate) fn read_members(members: &RwLock<Vec<Member>>) -> RwLockReadGuard<'_, Vec<Member>> {
    members.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_members(members: &RwLock<Vec<Member>>) -> RwLockWriteGuard<'_, Vec<Member>> {
    members.write().unwrap_or_else(PoisonError::into_inner)
}

/// Builder for [`Cluster`].
#[derive(Debug)]
pub struct ClusterBuilder {
    endpoints: String,
    client: Option<reqwest::Client>,
    policy: ProbePolicy,
    runtime: Option<Handle>,
}

impl ClusterBuilder {
    fn new(endpoints: String) -> Self {
        Self {
            endpoints,
            client: None,
            policy: ProbePolicy::default(),
            runtime: None,
        }
    }

    /// HTTP client used by recovery probes. A default client with the probe
    /// timeout is built when none is given.
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn probe_policy(mut self, policy: ProbePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn ping_path(mut self, path: impl Into<String>) -> Self {
        self.policy.path = path.into();
        self
    }

    pub fn probe_interval(mut self, interval: Duration) -> Self {
        self.policy.interval = interval;
        self
    }

    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.policy.timeout = timeout;
        self
    }

    /// Runtime that recovery probes are spawned on. Defaults to the runtime
    /// `build` is called from.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    pub fn build(self) -> Result<Cluster, ClusterError> {
        let endpoints = parse_endpoints(&self.endpoints)?;
        check_policy(&self.policy)?;

        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|_| ClusterError::NoRuntime)?,
        };

        let client = match self.client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .timeout(self.policy.timeout)
                .build()?,
        };

        let members: Vec<Member> = endpoints.into_iter().map(Member::new).collect();
        let size = members.len();

        let labels: Vec<&str> = members.iter().map(|m| m.endpoint().label()).collect();
        tracing::info!(
            members = size,
            endpoints = %labels.join(","),
            ping_path = %self.policy.path,
            "Cluster initialized"
        );
        metrics::record_membership(size, 0);

        Ok(Cluster {
            members: Arc::new(RwLock::new(members)),
            size,
            prober: Prober::new(client, self.policy),
            runtime,
            probes: Mutex::new(JoinSet::new()),
            probes_started: AtomicU64::new(0),
            shutdown: Shutdown::new(),
        })
    }
}

// A zero interval would re-probe a down member in a tight loop.
fn check_policy(policy: &ProbePolicy) -> Result<(), ClusterError> {
    if policy.interval.is_zero() {
        return Err(ClusterError::InvalidProbePolicy("interval must be greater than zero"));
    }
    if policy.timeout.is_zero() {
        return Err(ClusterError::InvalidProbePolicy("timeout must be greater than zero"));
    }
    if policy.path.trim_matches('/').is_empty() {
        return Err(ClusterError::InvalidProbePolicy("ping path must not be empty"));
    }
    Ok(())
}

/// Tracks which cluster members are usable and restores demoted ones.
///
/// Share it between callers with an `Arc`.
#[derive(Debug)]
pub struct Cluster {
    members: Members,
    size: usize,
    prober: Prober,
    runtime: Handle,
    probes: Mutex<JoinSet<()>>,
    probes_started: AtomicU64,
    shutdown: Shutdown,
}

impl Cluster {
    pub fn builder(endpoints: impl Into<String>) -> ClusterBuilder {
        ClusterBuilder::new(endpoints.into())
    }

    /// Build a cluster with default probe settings and the given client.
    pub fn new(client: reqwest::Client, endpoints: &str) -> Result<Self, ClusterError> {
        Self::builder(endpoints).client(client).build()
    }

    /// Build a cluster from a configuration, validating it first.
    pub fn from_config(config: &ClusterConfig) -> Result<Self, ClusterError> {
        validate_config(config).map_err(ClusterError::InvalidConfig)?;
        Self::builder(config.endpoints.as_str())
            .probe_policy(ProbePolicy::from(&config.probe))
            .build()
    }

    /// Address of the first member that is UP.
    pub fn select(&self) -> Result<String, ClusterError> {
        read_members(&self.members)
            .iter()
            .find(|m| m.is_up())
            .map(|m| m.address().to_string())
            .ok_or(ClusterError::NoHealthyEndpoint)
    }

    /// Report `address` as unreachable.
    ///
    /// The first UP member with that address goes DOWN and gets a recovery
    /// probe. Repeated or concurrent reports for a member that is already
    /// down do nothing.
    pub fn demote(&self, address: &str) {
        let (index, endpoint) = {
            let mut members = write_members(&self.members);
            let Some(index) = members
                .iter()
                .position(|m| m.is_up() && m.address() == address)
            else {
                tracing::trace!("Ignoring demotion, no matching member is up");
                return;
            };

            members[index].mark_down();
            let up = members.iter().filter(|m| m.is_up()).count();
            metrics::record_membership(up, members.len() - up);
            (index, members[index].endpoint().clone())
        };

        tracing::warn!(endpoint = %endpoint, "Marking cluster member down");
        metrics::record_demotion(endpoint.label());

        self.spawn_probe(index, endpoint);
    }

    fn spawn_probe(&self, index: usize, endpoint: Endpoint) {
        let mut probes = self.lock_probes();
        if self.shutdown.is_triggered() {
            tracing::info!(endpoint = %endpoint, "Cluster shut down, member left down without probe");
            return;
        }

        while let Some(result) = probes.try_join_next() {
            log_probe_exit(result);
        }

        let probe = RecoveryProbe::new(
            index,
            endpoint,
            Arc::clone(&self.members),
            self.prober.clone(),
            self.shutdown.subscribe(),
        );
        probes.spawn_on(probe.run(), &self.runtime);
        self.probes_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Addresses of all members with the given status, in input order.
    pub fn list_by_status(&self, status: MemberStatus) -> Vec<String> {
        read_members(&self.members)
            .iter()
            .filter(|m| m.status() == status)
            .map(|m| m.address().to_string())
            .collect()
    }

    pub fn active_members(&self) -> Vec<String> {
        self.list_by_status(MemberStatus::Up)
    }

    pub fn inactive_members(&self) -> Vec<String> {
        self.list_by_status(MemberStatus::Down)
    }

    /// Snapshot of every member and its status.
    pub fn members(&self) -> Vec<MemberSnapshot> {
        read_members(&self.members)
            .iter()
            .map(Member::snapshot)
            .collect()
    }

    /// Number of members. Fixed at construction.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Total recovery probes spawned since construction.
    pub fn probes_started(&self) -> u64 {
        self.probes_started.load(Ordering::Relaxed)
    }

    /// Recovery probes that have not finished yet.
    pub fn active_probes(&self) -> usize {
        let mut probes = self.lock_probes();
        while let Some(result) = probes.try_join_next() {
            log_probe_exit(result);
        }
        probes.len()
    }

    /// Cancel all recovery probes and wait for them to exit.
    ///
    /// Members still being probed stay DOWN. Later demotions still take
    /// effect but no longer start probes.
    pub async fn shutdown(&self) {
        let mut probes = {
            let mut probes = self.lock_probes();
            self.shutdown.trigger();
            std::mem::take(&mut *probes)
        };

        tracing::info!(outstanding = probes.len(), "Shutting down cluster, joining recovery probes");
        while let Some(result) = probes.join_next().await {
            log_probe_exit(result);
        }
        tracing::info!("Cluster shutdown complete");
    }

    fn lock_probes(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.probes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn log_probe_exit(result: Result<(), JoinError>) {
    if let Err(e) = result {
        if e.is_panic() {
            tracing::error!(error = %e, "Recovery probe panicked");
        }
    }
}
