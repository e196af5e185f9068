//! Cluster membership subsystem.
//!
//! # Data Flow
//! ```text
//! "http://10.0.0.1:8080,10.0.0.2:8080"
//!     → endpoint.rs (split, parse, normalize scheme)
//!     → member.rs (one Member per endpoint, all UP)
//!     → tracker.rs (Cluster owns members behind one RwLock)
//!
//! Caller request fails:
//!     → Cluster::demote(address)
//!     → UP → DOWN under the write lock
//!     → probe.rs (one recovery probe per demotion)
//!     → probe succeeds → DOWN → UP, task exits
//! ```
//!
//! # Design Decisions
//! - Only one endpoint is handed out at a time (first UP in input order)
//! - The demotion check-and-set is a single write-lock critical section
//! - Probes are owned by the cluster and joined on shutdown
//! - Probe failures never reach callers

pub mod endpoint;
pub mod error;
pub mod member;
pub mod probe;
pub mod tracker;

pub use endpoint::{parse_endpoints, Endpoint};
pub use error::{ClusterError, ParseError};
pub use member::{Member, MemberSnapshot, MemberStatus};
pub use probe::ProbePolicy;
pub use tracker::{Cluster, ClusterBuilder};
