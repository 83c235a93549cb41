use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use log::{info, warn};

use crate::connection::KeyedClientPool;
use crate::core::error::Result;
use crate::core::types::{Endpoint, Member};
use crate::protocol::SentinelClient;
use crate::reconcile::rpc;

/// Finds one authoritative membership list for a monitor group.
///
/// Scans candidates in list order; the first endpoint reporting a
/// non-empty membership wins and no further candidates are tried. The
/// result is one endpoint's view, never a merge across endpoints.
pub struct MembershipDiscovery {
    pool: Arc<dyn KeyedClientPool>,
    command_timeout: Duration,
}

impl MembershipDiscovery {
    pub fn new(pool: Arc<dyn KeyedClientPool>, command_timeout: Duration) -> Self {
        Self {
            pool,
            command_timeout,
        }
    }

    /// Returns the discovered membership, or `None` when no candidate
    /// reported a non-empty one.
    ///
    /// An empty candidate list or group name is a malformed deletion
    /// event: no RPC is attempted. A candidate that is unreachable, times
    /// out, or answers with an empty list never aborts the scan.
    pub async fn discover(&self, candidates: &[Endpoint], group: &str) -> Option<Vec<Member>> {
        if group.is_empty() {
            warn!("Monitor group name is empty, skipping discovery");
            return None;
        }
        if candidates.is_empty() {
            warn!(
                "Candidate endpoint list for group '{}' is empty, skipping discovery",
                group
            );
            return None;
        }

        for candidate in candidates {
            let reply = rpc::invoke(
                self.pool.as_ref(),
                candidate,
                group,
                self.command_timeout,
                fetch_members,
            )
            .await;

            match reply {
                Ok(members) if members.is_empty() => {
                    info!(
                        "{} does not know group '{}', trying next candidate",
                        candidate, group
                    );
                }
                Ok(mut members) => {
                    // The responder is implicitly a member but does not
                    // always list itself.
                    if members.iter().all(|m| m.endpoint != *candidate) {
                        members.push(Member::from_endpoint(candidate.clone()));
                    }
                    info!(
                        "Discovered {} member(s) of group '{}' from {}: {}",
                        members.len(),
                        group,
                        candidate,
                        describe(&members)
                    );
                    return Some(members);
                }
                Err(err) => {
                    warn!(
                        "Failed to query group '{}' members from {}: {}",
                        group, candidate, err
                    );
                }
            }
        }

        None
    }
}

fn fetch_members<'a>(
    client: &'a mut dyn SentinelClient,
    group: &'a str,
) -> BoxFuture<'a, Result<Vec<Member>>> {
    client.sentinels(group)
}

fn describe(members: &[Member]) -> String {
    members
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
