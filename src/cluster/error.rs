//! Cluster error types.

use thiserror::Error;

use crate::config::validation::{join_errors, ValidationError};

/// Errors raised while parsing the configured endpoint list.
///
/// All of these are fatal to construction: no cluster is built from a list
/// that contains a single bad entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("endpoint is blank")]
    BlankEndpoint,

    #[error("endpoint: {endpoint} is invalid reason: {reason}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        reason: url::ParseError,
    },

    #[error("endpoint: {endpoint} protocol must be (http|https), got {scheme:?}")]
    UnsupportedScheme { endpoint: String, scheme: String },

    #[error("endpoint: {endpoint} must have a host")]
    MissingHost { endpoint: String },
}

/// Errors surfaced by the membership tracker.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Every member is down. Callers should surface this as an outage.
    #[error("no healthy endpoint available, all cluster members are down")]
    NoHealthyEndpoint,

    #[error("cluster requires a tokio runtime to run recovery probes")]
    NoRuntime,

    #[error("invalid probe policy: {0}")]
    InvalidProbePolicy(&'static str),

    #[error("invalid configuration: {}", join_errors(.0))]
    InvalidConfig(Vec<ValidationError>),

    #[error("failed to build probe http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
