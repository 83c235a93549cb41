pub mod discovery;
pub mod removal;
mod rpc;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{info, warn};

use crate::connection::KeyedClientPool;
use crate::core::addr::parse_endpoints;
use crate::core::types::{ShardDeleteEvent, ShardEvent};

pub use discovery::MembershipDiscovery;
pub use removal::GroupRemoval;

/// Reconciliation tuning
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Per-RPC execution timeout
    pub command_timeout: Duration,
}

impl ReconcileConfig {
    pub fn new() -> Self {
        Self {
            command_timeout: Duration::from_secs(2),
        }
    }

    /// Set the per-RPC execution timeout
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Listener seam for shard lifecycle notifications.
#[async_trait]
pub trait ShardEventListener: Send + Sync {
    async fn on_event(&self, event: ShardEvent);
}

/// Reconciles the monitoring membership view after a shard is deleted.
///
/// Discovery runs against the event's candidate endpoints; if a membership
/// is found, every member is told to drop the group. Runs for different
/// events share no mutable state beyond the injected pool, so concurrent
/// notifications are fine.
pub struct SentinelReconciler {
    discovery: MembershipDiscovery,
    removal: GroupRemoval,
}

impl SentinelReconciler {
    pub fn new(pool: Arc<dyn KeyedClientPool>, config: ReconcileConfig) -> Self {
        Self {
            discovery: MembershipDiscovery::new(pool.clone(), config.command_timeout),
            removal: GroupRemoval::new(pool, config.command_timeout),
        }
    }

    /// Event gate: only deletions trigger reconciliation.
    ///
    /// Never returns an error to the notifier; every failure mode ends in
    /// a log line instead.
    pub async fn handle_event(&self, event: ShardEvent) {
        match event {
            ShardEvent::Deleted(event) => self.reconcile(&event).await,
            other => info!(
                "Ignoring shard event '{}': only deletions require sentinel reconciliation",
                other.kind()
            ),
        }
    }

    /// One full reconciliation run: parse candidates, discover the
    /// authoritative membership, fan out removals.
    pub async fn reconcile(&self, event: &ShardDeleteEvent) {
        info!(
            "Reconciling sentinels for cluster '{}', shard '{}', group '{}', candidates '{}'",
            event.cluster_id, event.shard_id, event.monitor_group, event.candidate_endpoints
        );

        if event.monitor_group.is_empty() {
            warn!(
                "Deletion event for shard '{}' has an empty monitor group, nothing to reconcile",
                event.shard_id
            );
            return;
        }
        if event.candidate_endpoints.trim().is_empty() {
            warn!(
                "Deletion event for group '{}' carries no candidate endpoints, nothing to reconcile",
                event.monitor_group
            );
            return;
        }

        let candidates = parse_endpoints(&event.candidate_endpoints);
        let Some(members) = self
            .discovery
            .discover(&candidates, &event.monitor_group)
            .await
        else {
            warn!(
                "Could not discover membership for group '{}', skipping removal",
                event.monitor_group
            );
            return;
        };

        self.removal
            .remove_from_all(&members, &event.monitor_group)
            .await;
    }
}

#[async_trait]
impl ShardEventListener for SentinelReconciler {
    async fn on_event(&self, event: ShardEvent) {
        self.handle_event(event).await;
    }
}
