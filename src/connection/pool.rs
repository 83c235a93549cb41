use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio::sync::Mutex;

use crate::connection::KeyedClientPool;
use crate::connection::config::PoolConfig;
use crate::core::error::{Result, SentinelError};
use crate::core::types::Endpoint;
use crate::protocol::{RespSentinelClient, SentinelClient};

/// Builds a new protocol client for an endpoint.
pub type Connector = Arc<
    dyn Fn(Endpoint, Duration) -> BoxFuture<'static, Result<Box<dyn SentinelClient>>>
        + Send
        + Sync,
>;

struct EndpointSlot {
    idle: VecDeque<Box<dyn SentinelClient>>,
    handed_out: usize,
}

impl EndpointSlot {
    fn new() -> Self {
        Self {
            idle: VecDeque::new(),
            handed_out: 0,
        }
    }

    fn total(&self) -> usize {
        self.idle.len() + self.handed_out
    }
}

/// Connection pool keyed by endpoint.
///
/// Each endpoint gets its own sub-pool behind its own lock, so concurrent
/// acquisitions for distinct endpoints never block each other. A client is
/// owned by exactly one caller between acquire and release.
pub struct KeyedSentinelPool {
    config: PoolConfig,
    connector: Connector,
    slots: Mutex<HashMap<Endpoint, Arc<Mutex<EndpointSlot>>>>,
}

impl KeyedSentinelPool {
    /// Create a pool that opens real protocol connections.
    pub fn new(config: PoolConfig) -> Result<Self> {
        let connector: Connector = Arc::new(|endpoint, connect_timeout| {
            Box::pin(async move {
                let client = RespSentinelClient::connect(&endpoint, connect_timeout).await?;
                Ok(Box::new(client) as Box<dyn SentinelClient>)
            })
        });
        Self::with_connector(config, connector)
    }

    /// Create a pool with a custom connector.
    ///
    /// Lets tests supply scripted clients without touching the network.
    pub fn with_connector(config: PoolConfig, connector: Connector) -> Result<Self> {
        config.validate().map_err(SentinelError::Validation)?;
        Ok(Self {
            config,
            connector,
            slots: Mutex::new(HashMap::new()),
        })
    }

    /// Get pool statistics
    pub async fn stats(&self) -> PoolStats {
        let slots = self.slots.lock().await;
        let mut stats = PoolStats {
            endpoints: slots.len(),
            idle: 0,
            handed_out: 0,
        };
        for slot in slots.values() {
            let state = slot.lock().await;
            stats.idle += state.idle.len();
            stats.handed_out += state.handed_out;
        }
        stats
    }

    async fn slot(&self, endpoint: &Endpoint) -> Arc<Mutex<EndpointSlot>> {
        let mut slots = self.slots.lock().await;
        slots
            .entry(endpoint.clone())
            .or_insert_with(|| Arc::new(Mutex::new(EndpointSlot::new())))
            .clone()
    }
}

#[async_trait]
impl KeyedClientPool for KeyedSentinelPool {
    async fn acquire(&self, endpoint: &Endpoint) -> Result<Box<dyn SentinelClient>> {
        let slot = self.slot(endpoint).await;
        let start = Instant::now();

        loop {
            let reserved = {
                let mut state = slot.lock().await;
                if let Some(client) = state.idle.pop_front() {
                    state.handed_out += 1;
                    return Ok(client);
                }
                if state.total() < self.config.max_per_endpoint {
                    // Reserve the cap space before the slow connect.
                    state.handed_out += 1;
                    true
                } else {
                    false
                }
            };

            if reserved {
                match (self.connector)(endpoint.clone(), self.config.connect_timeout).await {
                    Ok(client) => return Ok(client),
                    Err(err) => {
                        slot.lock().await.handed_out -= 1;
                        return Err(err);
                    }
                }
            }

            if start.elapsed() > self.config.acquire_timeout {
                return Err(SentinelError::ConnectionUnavailable {
                    endpoint: endpoint.to_string(),
                    reason: format!(
                        "pool exhausted: {} connections handed out",
                        self.config.max_per_endpoint
                    ),
                });
            }

            // Wait a bit before retrying
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn release(&self, endpoint: &Endpoint, client: Box<dyn SentinelClient>) {
        let slot = self.slot(endpoint).await;
        let mut state = slot.lock().await;
        if state.handed_out > 0 {
            state.handed_out -= 1;
        }
        // A command interrupted mid-reply leaves the stream desynchronized;
        // such connections are dropped instead of reused.
        if client.reusable() {
            state.idle.push_back(client);
        }
    }
}

/// Aggregate pool statistics
#[derive(Debug, Clone)]
pub struct PoolStats {
    pub endpoints: usize,
    pub idle: usize,
    pub handed_out: usize,
}

impl std::fmt::Display for PoolStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Pool Stats: {} endpoints, {} idle, {} handed out",
            self.endpoints, self.idle, self.handed_out
        )
    }
}
