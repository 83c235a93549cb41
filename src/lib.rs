// ============================================================================
// SentinelSweep Library
// ============================================================================

pub mod connection;
pub mod core;
pub mod protocol;
pub mod reconcile;

// Re-export main types for convenience
pub use crate::core::{Endpoint, Member, Result, SentinelError, ShardDeleteEvent, ShardEvent};
pub use crate::core::addr::parse_endpoints;

// Re-export connection API
pub use crate::connection::{
    InMemorySentinelPool, KeyedClientPool, KeyedSentinelPool, PoolConfig, ScriptedSentinel,
    pool::{Connector, PoolStats},
};

// Re-export protocol API
pub use crate::protocol::{RespSentinelClient, SentinelClient};

// Re-export reconciliation API
pub use crate::reconcile::{
    GroupRemoval, MembershipDiscovery, ReconcileConfig, SentinelReconciler, ShardEventListener,
};
