use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::connection::KeyedClientPool;
use crate::core::error::{Result, SentinelError};
use crate::core::types::{Endpoint, Member};
use crate::protocol::SentinelClient;

/// Scripted behavior and counters for one fake monitoring endpoint.
///
/// Counters record every acquisition and command attempt so tests can
/// assert how many RPCs a scan actually issued.
#[derive(Debug)]
pub struct ScriptedSentinel {
    members: Vec<Member>,
    fail_acquire: bool,
    fail_commands: bool,
    command_delay: Option<Duration>,
    acquire_attempts: AtomicUsize,
    releases: AtomicUsize,
    list_calls: AtomicUsize,
    remove_calls: AtomicUsize,
}

impl ScriptedSentinel {
    /// An endpoint that reports the given membership.
    pub fn reporting(members: Vec<Member>) -> Self {
        Self {
            members,
            fail_acquire: false,
            fail_commands: false,
            command_delay: None,
            acquire_attempts: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            remove_calls: AtomicUsize::new(0),
        }
    }

    /// An endpoint that answers but does not know the group.
    pub fn uninformed() -> Self {
        Self::reporting(Vec::new())
    }

    /// An endpoint whose connections cannot be acquired.
    pub fn unreachable() -> Self {
        let mut script = Self::uninformed();
        script.fail_acquire = true;
        script
    }

    /// An endpoint whose commands fail with a protocol error.
    pub fn failing() -> Self {
        let mut script = Self::uninformed();
        script.fail_commands = true;
        script
    }

    /// Delay every command, e.g. past the caller's timeout.
    pub fn with_command_delay(mut self, delay: Duration) -> Self {
        self.command_delay = Some(delay);
        self
    }

    pub fn acquire_attempts(&self) -> usize {
        self.acquire_attempts.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn remove_calls(&self) -> usize {
        self.remove_calls.load(Ordering::SeqCst)
    }

    async fn maybe_delay(&self) {
        if let Some(delay) = self.command_delay {
            tokio::time::sleep(delay).await;
        }
    }
}

/// An in-memory implementation of `KeyedClientPool` for testing.
///
/// Hands out clients backed by scripted endpoint behavior instead of real
/// connections; every acquisition, release, and command is counted.
#[derive(Default)]
pub struct InMemorySentinelPool {
    endpoints: Mutex<HashMap<Endpoint, Arc<ScriptedSentinel>>>,
}

impl InMemorySentinelPool {
    /// Creates a new, empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a scripted endpoint and returns its shared script handle
    /// for later counter assertions.
    pub async fn register(
        &self,
        endpoint: Endpoint,
        script: ScriptedSentinel,
    ) -> Arc<ScriptedSentinel> {
        let script = Arc::new(script);
        let mut endpoints = self.endpoints.lock().await;
        endpoints.insert(endpoint, script.clone());
        script
    }

    async fn script(&self, endpoint: &Endpoint) -> Option<Arc<ScriptedSentinel>> {
        let endpoints = self.endpoints.lock().await;
        endpoints.get(endpoint).cloned()
    }
}

#[async_trait]
impl KeyedClientPool for InMemorySentinelPool {
    async fn acquire(&self, endpoint: &Endpoint) -> Result<Box<dyn SentinelClient>> {
        let Some(script) = self.script(endpoint).await else {
            return Err(SentinelError::ConnectionUnavailable {
                endpoint: endpoint.to_string(),
                reason: "endpoint is not registered".to_string(),
            });
        };

        script.acquire_attempts.fetch_add(1, Ordering::SeqCst);
        if script.fail_acquire {
            return Err(SentinelError::ConnectionUnavailable {
                endpoint: endpoint.to_string(),
                reason: "scripted as unreachable".to_string(),
            });
        }

        Ok(Box::new(ScriptedClient {
            endpoint: endpoint.clone(),
            script,
        }))
    }

    async fn release(&self, endpoint: &Endpoint, _client: Box<dyn SentinelClient>) {
        if let Some(script) = self.script(endpoint).await {
            script.releases.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[derive(Debug)]
struct ScriptedClient {
    endpoint: Endpoint,
    script: Arc<ScriptedSentinel>,
}

#[async_trait]
impl SentinelClient for ScriptedClient {
    async fn sentinels(&mut self, _group: &str) -> Result<Vec<Member>> {
        self.script.list_calls.fetch_add(1, Ordering::SeqCst);
        self.script.maybe_delay().await;
        if self.script.fail_commands {
            return Err(SentinelError::Protocol {
                endpoint: self.endpoint.to_string(),
                reason: "scripted command failure".to_string(),
            });
        }
        Ok(self.script.members.clone())
    }

    async fn remove(&mut self, _group: &str) -> Result<String> {
        self.script.remove_calls.fetch_add(1, Ordering::SeqCst);
        self.script.maybe_delay().await;
        if self.script.fail_commands {
            return Err(SentinelError::Protocol {
                endpoint: self.endpoint.to_string(),
                reason: "scripted command failure".to_string(),
            });
        }
        Ok("OK".to_string())
    }
}
