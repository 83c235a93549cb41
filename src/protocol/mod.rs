pub mod resp;

use async_trait::async_trait;

use crate::core::error::Result;
use crate::core::types::Member;

pub use resp::RespSentinelClient;

/// Command surface of one connection to a monitoring process.
///
/// A client is owned exclusively by one caller at a time; the connection
/// pool hands them out and takes them back. Implementations classify their
/// failures as `ConnectionUnavailable` (transport) or `Protocol` (the
/// endpoint answered, but not with what we asked for).
#[async_trait]
pub trait SentinelClient: Send + std::fmt::Debug {
    /// Lists the members currently watching `group`, as reported by this
    /// endpoint. An empty list means the endpoint is reachable but does not
    /// know the group.
    async fn sentinels(&mut self, group: &str) -> Result<Vec<Member>>;

    /// Tells this endpoint to stop watching `group`. Removing a group the
    /// endpoint no longer watches is a harmless no-op; the returned status
    /// string is for logging only.
    async fn remove(&mut self, group: &str) -> Result<String>;

    /// Whether this connection can go back to a pool for another command.
    /// False once a command was interrupted or failed mid-reply.
    fn reusable(&self) -> bool {
        true
    }
}
