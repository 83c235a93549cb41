use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, join_all};
use log::{info, warn};

use crate::connection::KeyedClientPool;
use crate::core::error::Result;
use crate::core::types::Member;
use crate::protocol::SentinelClient;
use crate::reconcile::rpc;

/// Best-effort fan-out telling every discovered member to drop a group.
pub struct GroupRemoval {
    pool: Arc<dyn KeyedClientPool>,
    command_timeout: Duration,
}

impl GroupRemoval {
    pub fn new(pool: Arc<dyn KeyedClientPool>, command_timeout: Duration) -> Self {
        Self {
            pool,
            command_timeout,
        }
    }

    /// Issues exactly one removal RPC per member, concurrently.
    ///
    /// Removals are independent and idempotent, so one member's failure
    /// never halts the others and there is no aggregate status to return;
    /// each outcome goes to the log.
    pub async fn remove_from_all(&self, members: &[Member], group: &str) {
        let removals = members.iter().map(|member| self.remove_one(member, group));
        join_all(removals).await;
    }

    async fn remove_one(&self, member: &Member, group: &str) {
        let reply = rpc::invoke(
            self.pool.as_ref(),
            &member.endpoint,
            group,
            self.command_timeout,
            issue_remove,
        )
        .await;

        match reply {
            Ok(status) => info!("Removed group '{}' from {}: {}", group, member, status),
            Err(err) => warn!("Failed to remove group '{}' from {}: {}", group, member, err),
        }
    }
}

fn issue_remove<'a>(
    client: &'a mut dyn SentinelClient,
    group: &'a str,
) -> BoxFuture<'a, Result<String>> {
    client.remove(group)
}
