pub mod config;
pub mod in_memory;
pub mod pool;

use async_trait::async_trait;

use crate::core::error::Result;
use crate::core::types::Endpoint;
use crate::protocol::SentinelClient;

pub use config::PoolConfig;
pub use in_memory::{InMemorySentinelPool, ScriptedSentinel};
pub use pool::KeyedSentinelPool;

/// Capability for acquiring reusable protocol clients keyed by endpoint.
///
/// Injected into discovery and removal so tests can substitute an
/// in-memory fake. Implementations must let concurrent acquisitions for
/// distinct endpoints proceed independently and must never hand the same
/// client to two callers at once.
#[async_trait]
pub trait KeyedClientPool: Send + Sync {
    /// Hands out a client connected to `endpoint`. The caller owns it
    /// exclusively until it is released.
    async fn acquire(&self, endpoint: &Endpoint) -> Result<Box<dyn SentinelClient>>;

    /// Returns a previously acquired client for reuse.
    async fn release(&self, endpoint: &Endpoint, client: Box<dyn SentinelClient>);
}
