use std::sync::Arc;
use std::time::Duration;

use sentinelsweep::{
    Endpoint, GroupRemoval, InMemorySentinelPool, Member, MembershipDiscovery, ReconcileConfig,
    ScriptedSentinel, SentinelReconciler, ShardDeleteEvent, ShardEvent,
};

const GROUP: &str = "cluster-one-shard-1";
const COMMAND_TIMEOUT: Duration = Duration::from_millis(500);

fn endpoint(n: u8) -> Endpoint {
    Endpoint::new(format!("10.0.0.{}", n), 26379)
}

fn member(n: u8) -> Member {
    Member::new(endpoint(n), format!("sentinel-{}", n))
}

fn discovery(pool: &Arc<InMemorySentinelPool>) -> MembershipDiscovery {
    MembershipDiscovery::new(pool.clone(), COMMAND_TIMEOUT)
}

fn removal(pool: &Arc<InMemorySentinelPool>) -> GroupRemoval {
    GroupRemoval::new(pool.clone(), COMMAND_TIMEOUT)
}

fn reconciler(pool: &Arc<InMemorySentinelPool>) -> SentinelReconciler {
    SentinelReconciler::new(
        pool.clone(),
        ReconcileConfig::new().command_timeout(COMMAND_TIMEOUT),
    )
}

#[tokio::test]
async fn discovery_stops_at_first_informed_candidate() {
    let pool = Arc::new(InMemorySentinelPool::new());
    let s1 = pool
        .register(endpoint(1), ScriptedSentinel::unreachable())
        .await;
    let s2 = pool
        .register(endpoint(2), ScriptedSentinel::uninformed())
        .await;
    let s3 = pool
        .register(
            endpoint(3),
            ScriptedSentinel::reporting(vec![member(4), member(5)]),
        )
        .await;
    let s4 = pool
        .register(
            endpoint(4),
            ScriptedSentinel::reporting(vec![member(5)]),
        )
        .await;

    let candidates = vec![endpoint(1), endpoint(2), endpoint(3), endpoint(4)];
    let members = discovery(&pool)
        .discover(&candidates, GROUP)
        .await
        .expect("third candidate had a non-empty view");

    // The winning view plus the synthesized responder, in reported order.
    assert_eq!(
        members,
        vec![member(4), member(5), Member::from_endpoint(endpoint(3))]
    );

    // Exactly one attempt per scanned candidate, none past the winner.
    assert_eq!(s1.acquire_attempts(), 1);
    assert_eq!(s2.acquire_attempts(), 1);
    assert_eq!(s3.acquire_attempts(), 1);
    assert_eq!(s4.acquire_attempts(), 0);
    assert_eq!(s2.list_calls(), 1);
    assert_eq!(s3.list_calls(), 1);
}

#[tokio::test]
async fn discovery_does_not_duplicate_a_responder_that_lists_itself() {
    // Scenario: first candidate unreachable, second reports a view that
    // already contains the second candidate itself.
    let pool = Arc::new(InMemorySentinelPool::new());
    let s1 = pool
        .register(endpoint(1), ScriptedSentinel::unreachable())
        .await;
    let s2 = pool
        .register(
            endpoint(2),
            ScriptedSentinel::reporting(vec![member(2), member(3)]),
        )
        .await;

    let candidates = vec![endpoint(1), endpoint(2)];
    let members = discovery(&pool)
        .discover(&candidates, GROUP)
        .await
        .expect("second candidate responded");

    assert_eq!(members, vec![member(2), member(3)]);
    assert_eq!(s1.acquire_attempts() + s2.acquire_attempts(), 2);
}

#[tokio::test]
async fn discovery_treats_empty_reply_as_no_membership() {
    let pool = Arc::new(InMemorySentinelPool::new());
    let s1 = pool
        .register(endpoint(1), ScriptedSentinel::uninformed())
        .await;

    let members = discovery(&pool).discover(&[endpoint(1)], GROUP).await;

    assert!(members.is_none());
    assert_eq!(s1.acquire_attempts(), 1);
    assert_eq!(s1.list_calls(), 1);
}

#[tokio::test]
async fn discovery_with_empty_group_name_attempts_no_rpc() {
    let pool = Arc::new(InMemorySentinelPool::new());
    let s1 = pool
        .register(endpoint(1), ScriptedSentinel::reporting(vec![member(2)]))
        .await;

    let members = discovery(&pool).discover(&[endpoint(1)], "").await;

    assert!(members.is_none());
    assert_eq!(s1.acquire_attempts(), 0);
}

#[tokio::test]
async fn discovery_with_no_candidates_attempts_no_rpc() {
    let pool = Arc::new(InMemorySentinelPool::new());
    let members = discovery(&pool).discover(&[], GROUP).await;
    assert!(members.is_none());
}

#[tokio::test]
async fn discovery_exhausts_every_candidate_before_giving_up() {
    let pool = Arc::new(InMemorySentinelPool::new());
    let s1 = pool
        .register(endpoint(1), ScriptedSentinel::unreachable())
        .await;
    let s2 = pool.register(endpoint(2), ScriptedSentinel::failing()).await;
    let s3 = pool
        .register(endpoint(3), ScriptedSentinel::uninformed())
        .await;

    let candidates = vec![endpoint(1), endpoint(2), endpoint(3)];
    let members = discovery(&pool).discover(&candidates, GROUP).await;

    assert!(members.is_none());
    assert_eq!(s1.acquire_attempts(), 1);
    assert_eq!(s2.acquire_attempts(), 1);
    assert_eq!(s3.acquire_attempts(), 1);
}

#[tokio::test]
async fn discovery_timeout_on_one_candidate_moves_to_the_next() {
    let pool = Arc::new(InMemorySentinelPool::new());
    let slow = pool
        .register(
            endpoint(1),
            ScriptedSentinel::reporting(vec![member(9)])
                .with_command_delay(Duration::from_millis(200)),
        )
        .await;
    let s2 = pool
        .register(endpoint(2), ScriptedSentinel::reporting(vec![member(3)]))
        .await;

    let fast = MembershipDiscovery::new(pool.clone(), Duration::from_millis(20));
    let members = fast
        .discover(&[endpoint(1), endpoint(2)], GROUP)
        .await
        .expect("second candidate answered in time");

    assert_eq!(
        members,
        vec![member(3), Member::from_endpoint(endpoint(2))]
    );
    // The timed-out connection still went back to the pool.
    assert_eq!(slow.releases(), 1);
    assert_eq!(s2.releases(), 1);
}

#[tokio::test]
async fn removal_attempts_one_rpc_per_member_despite_failures() {
    // Scenario: second member times out; first and third still get their
    // removal command and the run completes.
    let pool = Arc::new(InMemorySentinelPool::new());
    let s1 = pool
        .register(endpoint(1), ScriptedSentinel::uninformed())
        .await;
    let s2 = pool
        .register(
            endpoint(2),
            ScriptedSentinel::uninformed().with_command_delay(Duration::from_millis(200)),
        )
        .await;
    let s3 = pool
        .register(endpoint(3), ScriptedSentinel::uninformed())
        .await;

    let members = vec![member(1), member(2), member(3)];
    GroupRemoval::new(pool.clone(), Duration::from_millis(20))
        .remove_from_all(&members, GROUP)
        .await;

    assert_eq!(s1.remove_calls(), 1);
    assert_eq!(s2.remove_calls(), 1);
    assert_eq!(s3.remove_calls(), 1);
    assert_eq!(s2.releases(), 1);
}

#[tokio::test]
async fn removal_is_idempotent_across_runs() {
    let pool = Arc::new(InMemorySentinelPool::new());
    let s1 = pool
        .register(endpoint(1), ScriptedSentinel::uninformed())
        .await;
    let s2 = pool.register(endpoint(2), ScriptedSentinel::failing()).await;

    let members = vec![member(1), member(2)];
    let removal = removal(&pool);
    removal.remove_from_all(&members, GROUP).await;
    removal.remove_from_all(&members, GROUP).await;

    // Same attempts both times, the failing member included.
    assert_eq!(s1.remove_calls(), 2);
    assert_eq!(s2.remove_calls(), 2);
}

#[tokio::test]
async fn reconciler_runs_discovery_then_removal() {
    let pool = Arc::new(InMemorySentinelPool::new());
    let s1 = pool
        .register(
            endpoint(1),
            ScriptedSentinel::reporting(vec![member(2), member(3)]),
        )
        .await;
    let s2 = pool
        .register(endpoint(2), ScriptedSentinel::uninformed())
        .await;
    let s3 = pool
        .register(endpoint(3), ScriptedSentinel::uninformed())
        .await;

    let event = ShardDeleteEvent::new(
        "cluster-one",
        "shard-1",
        GROUP,
        "10.0.0.1:26379",
    );
    reconciler(&pool)
        .handle_event(ShardEvent::Deleted(event))
        .await;

    // Discovered members 2 and 3 plus the synthesized responder 1.
    assert_eq!(s1.list_calls(), 1);
    assert_eq!(s1.remove_calls(), 1);
    assert_eq!(s2.remove_calls(), 1);
    assert_eq!(s3.remove_calls(), 1);
}

#[tokio::test]
async fn reconciler_skips_removal_when_discovery_finds_nothing() {
    let pool = Arc::new(InMemorySentinelPool::new());
    let s1 = pool
        .register(endpoint(1), ScriptedSentinel::uninformed())
        .await;

    let event = ShardDeleteEvent::new("cluster-one", "shard-1", GROUP, "10.0.0.1:26379");
    reconciler(&pool)
        .handle_event(ShardEvent::Deleted(event))
        .await;

    assert_eq!(s1.list_calls(), 1);
    assert_eq!(s1.remove_calls(), 0);
}

#[tokio::test]
async fn reconciler_ignores_non_delete_events() {
    let pool = Arc::new(InMemorySentinelPool::new());
    let s1 = pool
        .register(endpoint(1), ScriptedSentinel::reporting(vec![member(2)]))
        .await;

    reconciler(&pool)
        .handle_event(ShardEvent::Created {
            cluster_id: "cluster-one".to_string(),
            shard_id: "shard-1".to_string(),
        })
        .await;

    assert_eq!(s1.acquire_attempts(), 0);
}

#[tokio::test]
async fn reconciler_skips_malformed_deletion_events() {
    let pool = Arc::new(InMemorySentinelPool::new());
    let s1 = pool
        .register(endpoint(1), ScriptedSentinel::reporting(vec![member(2)]))
        .await;
    let reconciler = reconciler(&pool);

    let empty_group = ShardDeleteEvent::new("cluster-one", "shard-1", "", "10.0.0.1:26379");
    reconciler
        .handle_event(ShardEvent::Deleted(empty_group))
        .await;

    let no_candidates = ShardDeleteEvent::new("cluster-one", "shard-1", GROUP, "   ");
    reconciler
        .handle_event(ShardEvent::Deleted(no_candidates))
        .await;

    let garbage_candidates =
        ShardDeleteEvent::new("cluster-one", "shard-1", GROUP, "not-an-endpoint");
    reconciler
        .handle_event(ShardEvent::Deleted(garbage_candidates))
        .await;

    assert_eq!(s1.acquire_attempts(), 0);
}
