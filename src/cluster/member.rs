//! Cluster member and its health status.
//!
//! # State Transitions
//! ```text
//! UP   → DOWN: caller reports a failed interaction (Cluster::demote)
//! DOWN → UP:   the member's recovery probe succeeds
//! ```

use serde::Serialize;
use std::fmt;

use crate::cluster::endpoint::Endpoint;

/// Health status of a cluster member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MemberStatus {
    Up,
    Down,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Up => "UP",
            MemberStatus::Down => "DOWN",
        }
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single endpoint of the cluster.
#[derive(Debug, Clone)]
pub struct Member {
    endpoint: Endpoint,
    status: MemberStatus,
}

impl Member {
    /// Members start out UP.
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            status: MemberStatus::Up,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn address(&self) -> &str {
        self.endpoint.address()
    }

    pub fn status(&self) -> MemberStatus {
        self.status
    }

    pub fn is_up(&self) -> bool {
        self.status == MemberStatus::Up
    }

    /// Transition UP → DOWN. Returns false if the member was already down.
    pub(crate) fn mark_down(&mut self) -> bool {
        if self.status != MemberStatus::Up {
            return false;
        }
        self.status = MemberStatus::Down;
        true
    }

    /// Transition DOWN → UP. Returns false if the member was already up.
    pub(crate) fn mark_up(&mut self) -> bool {
        if self.status != MemberStatus::Down {
            return false;
        }
        self.status = MemberStatus::Up;
        true
    }

    pub fn snapshot(&self) -> MemberSnapshot {
        MemberSnapshot {
            endpoint: self.address().to_string(),
            status: self.status,
        }
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "member: {}:{}", self.endpoint, self.status)
    }
}

/// Point-in-time view of a member, detached from the cluster lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberSnapshot {
    pub endpoint: String,
    pub status: MemberStatus,
}
