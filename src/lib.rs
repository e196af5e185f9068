//! Client-side membership and failover tracking for clustered services.
//!
//! A [`Cluster`] is built once from a comma-separated endpoint list. Callers
//! ask it for the current healthy endpoint, issue their own request, and
//! report the endpoint back with [`Cluster::demote`] when the request fails.
//! Demoted endpoints are probed in the background and restored once their
//! liveness path answers `200 OK` again.
//!
//! ```no_run
//! # async fn run() -> Result<(), swan_cluster::ClusterError> {
//! let cluster = swan_cluster::Cluster::new(reqwest::Client::new(), "http://10.0.0.1:8080,10.0.0.2:8080")?;
//! let endpoint = cluster.select()?;
//! // request against `endpoint` failed:
//! cluster.demote(&endpoint);
//! cluster.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod cluster;
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use cluster::{Cluster, ClusterBuilder, ClusterError, MemberStatus, ParseError};
pub use config::ClusterConfig;
pub use lifecycle::Shutdown;
