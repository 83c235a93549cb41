use std::time::Duration;

use futures::future::BoxFuture;

use crate::connection::KeyedClientPool;
use crate::core::error::{Result, SentinelError};
use crate::core::types::Endpoint;
use crate::protocol::SentinelClient;

/// Runs one protocol command against a pooled connection.
///
/// Acquires a client for `endpoint`, runs `op` under `command_timeout`,
/// and releases the client on every exit path: success, command failure,
/// and timeout. An elapsed timeout is classified as `SentinelError::Timeout`.
pub(crate) async fn invoke<T, F>(
    pool: &dyn KeyedClientPool,
    endpoint: &Endpoint,
    group: &str,
    command_timeout: Duration,
    op: F,
) -> Result<T>
where
    F: for<'a> FnOnce(&'a mut dyn SentinelClient, &'a str) -> BoxFuture<'a, Result<T>>,
{
    let mut client = pool.acquire(endpoint).await?;

    let outcome = tokio::time::timeout(command_timeout, op(client.as_mut(), group)).await;
    pool.release(endpoint, client).await;

    match outcome {
        Ok(result) => result,
        Err(_) => Err(SentinelError::Timeout {
            endpoint: endpoint.to_string(),
            timeout_ms: command_timeout.as_millis() as u64,
        }),
    }
}
