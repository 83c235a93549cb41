use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::SentinelError;

/// A reachable monitoring-process instance, identified by (host, port).
///
/// Equality is by value: the same pair is the same endpoint whether it came
/// from a deletion event or a membership reply. Used both as the connection
/// pool key and as the identity of a member inside a membership list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for Endpoint {
    type Err = SentinelError;

    /// Parses "host:port". The port is taken after the last colon so
    /// bracketed IPv6 hosts keep their inner colons.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s.rsplit_once(':').ok_or_else(|| {
            SentinelError::Validation(format!("Endpoint '{}' is missing a port", s))
        })?;

        if host.is_empty() {
            return Err(SentinelError::Validation(format!(
                "Endpoint '{}' has an empty host",
                s
            )));
        }

        let port = port.parse::<u16>().map_err(|_| {
            SentinelError::Validation(format!("Endpoint '{}' has an invalid port", s))
        })?;

        Ok(Self::new(host, port))
    }
}

/// One entry of a monitoring endpoint's reported membership.
///
/// `reported_name` is whatever the protocol reported for the member and is
/// used for display and logging only; identity is the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub endpoint: Endpoint,
    pub reported_name: String,
}

impl Member {
    pub fn new(endpoint: Endpoint, reported_name: impl Into<String>) -> Self {
        Self {
            endpoint,
            reported_name: reported_name.into(),
        }
    }

    /// Synthesizes a member for an endpoint we only know by address,
    /// e.g. the responder appended to its own reported membership.
    pub fn from_endpoint(endpoint: Endpoint) -> Self {
        let reported_name = endpoint.to_string();
        Self {
            endpoint,
            reported_name,
        }
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.endpoint, self.reported_name)
    }
}

/// Payload of a "shard deleted" notification.
///
/// Produced by the shard-lifecycle component at the moment a shard is
/// removed; consumed exactly once by the reconciler; never persisted.
/// The serde shape matches the notifier wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardDeleteEvent {
    pub cluster_id: String,
    pub shard_id: String,
    #[serde(rename = "monitorGroupName")]
    pub monitor_group: String,
    /// Raw delimiter-separated "host:port" list of candidate sentinels.
    pub candidate_endpoints: String,
    #[serde(default = "Utc::now")]
    pub deleted_at: DateTime<Utc>,
}

impl ShardDeleteEvent {
    pub fn new(
        cluster_id: impl Into<String>,
        shard_id: impl Into<String>,
        monitor_group: impl Into<String>,
        candidate_endpoints: impl Into<String>,
    ) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            shard_id: shard_id.into(),
            monitor_group: monitor_group.into(),
            candidate_endpoints: candidate_endpoints.into(),
            deleted_at: Utc::now(),
        }
    }
}

/// Shard lifecycle notifications as delivered by the notifier.
///
/// Only `Deleted` carries work for sentinel reconciliation; the other
/// variants exist so the event gate can route them to a logged no-op
/// instead of inspecting runtime types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShardEvent {
    #[serde(rename_all = "camelCase")]
    Created { cluster_id: String, shard_id: String },
    #[serde(rename_all = "camelCase")]
    Updated { cluster_id: String, shard_id: String },
    Deleted(ShardDeleteEvent),
}

impl ShardEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::Updated { .. } => "updated",
            Self::Deleted(_) => "deleted",
        }
    }
}
