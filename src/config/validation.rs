//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: ClusterConfig → Result<(), Vec<ValidationError>>
//! - The endpoint list is checked with the same parser the cluster uses

use std::net::SocketAddr;
use thiserror::Error;

use crate::cluster::endpoint::parse_endpoints;
use crate::cluster::error::ParseError;
use crate::config::schema::ClusterConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("endpoints: {0}")]
    Endpoints(#[from] ParseError),

    #[error("probe.path must not be empty")]
    EmptyProbePath,

    #[error("probe.interval_secs must be greater than zero")]
    ZeroProbeInterval,

    #[error("probe.timeout_secs must be greater than zero")]
    ZeroProbeTimeout,

    #[error("observability.metrics_address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),
}

pub(crate) fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn validate_config(config: &ClusterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = parse_endpoints(&config.endpoints) {
        errors.push(ValidationError::Endpoints(e));
    }

    if config.probe.path.trim_matches('/').is_empty() {
        errors.push(ValidationError::EmptyProbePath);
    }
    if config.probe.interval_secs == 0 {
        errors.push(ValidationError::ZeroProbeInterval);
    }
    if config.probe.timeout_secs == 0 {
        errors.push(ValidationError::ZeroProbeTimeout);
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
