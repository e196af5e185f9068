//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Cluster::shutdown() → trigger → every recovery probe exits its wait
//!     → probes joined
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → caller triggers graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Probes never outlive their cluster: they are joined on shutdown and
//!   aborted if the cluster is dropped
//! - A probe subscribing after shutdown fired exits immediately

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownSignal};
