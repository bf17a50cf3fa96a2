mod common;

use common::{container, entity, memory_store, payload, registry_with, trip, MockRemoteTarget};
use fleetsync::{
    ConnectivityMonitor, LocalStore, OperationKind, PendingOperationDraft, StatusService,
    SyncReport, SyncService, SyncState,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn create_then_update_flushes_cleanly() {
    let store = memory_store().await;
    let remote = MockRemoteTarget::new();
    let registry = registry_with(vec![(trip(), Arc::new(remote.clone()) as _)]);
    let service = SyncService::new(store.clone(), registry);

    store
        .stage_local_write(PendingOperationDraft::create(
            trip(),
            entity("T1"),
            payload(json!({"origin": "depot"})),
        ))
        .await
        .unwrap();
    store
        .stage_local_write(PendingOperationDraft::update(
            trip(),
            entity("T1"),
            payload(json!({"status": "closed"})),
        ))
        .await
        .unwrap();

    let report = service.sync_all().await;

    assert!(report.success);
    assert_eq!(report.synced, 2);
    assert_eq!(report.failed, 0);
    assert!(report.errors.is_empty());

    assert_eq!(store.pending_count().await.unwrap(), 0);

    // Replay order is preserved per record.
    assert_eq!(
        remote.calls().await,
        vec![
            ("create".to_string(), "T1".to_string()),
            ("update".to_string(), "T1".to_string()),
        ]
    );

    let meta = store.metadata(&trip()).await.unwrap().unwrap();
    assert_eq!(meta.status, SyncState::Idle);
    assert_eq!(meta.version, 1);
}

#[tokio::test]
async fn rejected_update_stays_queued_for_retry() {
    let store = memory_store().await;
    let remote = MockRemoteTarget::new();
    remote.reject("update", "T1").await;
    let registry = registry_with(vec![(trip(), Arc::new(remote.clone()) as _)]);
    let service = SyncService::new(store.clone(), registry);

    store
        .stage_local_write(PendingOperationDraft::create(
            trip(),
            entity("T1"),
            payload(json!({"origin": "depot"})),
        ))
        .await
        .unwrap();
    store
        .stage_local_write(PendingOperationDraft::update(
            trip(),
            entity("T1"),
            payload(json!({"status": "closed"})),
        ))
        .await
        .unwrap();

    let report = service.sync_all().await;

    assert!(!report.success);
    assert_eq!(report.synced, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.errors.len(), 1);

    let remaining = store.list_pending(None).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].operation, OperationKind::Update);
    assert_eq!(remaining[0].retry_count, 1);
    assert!(remaining[0].last_error.is_some());

    let meta = store.metadata(&trip()).await.unwrap().unwrap();
    assert_eq!(meta.status, SyncState::Error);
    assert_eq!(meta.version, 0);

    // Once the backend accepts the patch, the next flush drains it.
    remote.accept("update", "T1").await;
    let report = service.sync_all().await;
    assert!(report.success);
    assert_eq!(report.synced, 1);
    assert_eq!(store.pending_count().await.unwrap(), 0);

    let meta = store.metadata(&trip()).await.unwrap().unwrap();
    assert_eq!(meta.status, SyncState::Idle);
    assert_eq!(meta.version, 1);
}

#[tokio::test]
async fn one_bad_record_does_not_block_the_rest() {
    let store = memory_store().await;
    let remote = MockRemoteTarget::new();
    remote.reject("create", "T2").await;
    let registry = registry_with(vec![(trip(), Arc::new(remote.clone()) as _)]);
    let service = SyncService::new(store.clone(), registry);

    for id in ["T1", "T2", "T3"] {
        store
            .stage_local_write(PendingOperationDraft::create(
                trip(),
                entity(id),
                payload(json!({"id": id})),
            ))
            .await
            .unwrap();
    }

    let report = service.sync_all().await;

    assert!(!report.success);
    assert_eq!(report.synced, 2);
    assert_eq!(report.failed, 1);

    let remaining = store.list_pending(None).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].entity_id, entity("T2"));
}

#[tokio::test]
async fn unregistered_entity_type_is_recorded_as_failure() {
    let store = memory_store().await;
    let registry = registry_with(vec![]);
    let service = SyncService::new(store.clone(), registry);

    store
        .stage_local_write(PendingOperationDraft::create(
            trip(),
            entity("T1"),
            payload(json!({})),
        ))
        .await
        .unwrap();

    let report = service.sync_all().await;

    assert!(!report.success);
    assert_eq!(report.failed, 1);

    let remaining = store.list_pending(None).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].retry_count, 1);
    assert!(remaining[0]
        .last_error
        .as_deref()
        .unwrap()
        .contains("no remote target registered"));
}

#[tokio::test]
async fn concurrent_sync_yields_a_single_flush() {
    let store = memory_store().await;
    let remote = MockRemoteTarget::with_delay(50);
    let registry = registry_with(vec![(trip(), Arc::new(remote.clone()) as _)]);
    let service = Arc::new(SyncService::new(store.clone(), registry));

    store
        .stage_local_write(PendingOperationDraft::create(
            trip(),
            entity("T1"),
            payload(json!({})),
        ))
        .await
        .unwrap();

    let (first, second) = tokio::join!(service.sync_all(), service.sync_all());

    let (real, guarded) = if first == SyncReport::already_syncing() {
        (second, first)
    } else {
        (first, second)
    };

    assert!(real.success);
    assert_eq!(real.synced, 1);
    assert_eq!(guarded, SyncReport::already_syncing());

    // Exactly one real dispatch reached the backend.
    assert_eq!(remote.calls().await.len(), 1);
    assert!(!service.is_syncing().await);
}

#[tokio::test]
async fn empty_queue_flush_reports_clean_success() {
    let store = memory_store().await;
    let registry = registry_with(vec![]);
    let service = SyncService::new(store.clone(), registry);

    let report = service.sync_all().await;

    assert!(report.success);
    assert_eq!(report.synced, 0);
    assert_eq!(report.failed, 0);
    // An empty flush does not create metadata rows or bump versions.
    assert!(store.metadata(&trip()).await.unwrap().is_none());
}

#[tokio::test]
async fn groups_drain_in_order_of_oldest_operation() {
    let store = memory_store().await;
    let remote = MockRemoteTarget::new();
    let target: Arc<MockRemoteTarget> = Arc::new(remote.clone());
    let registry = registry_with(vec![
        (trip(), target.clone() as _),
        (container(), target as _),
    ]);
    let service = SyncService::new(store.clone(), registry);

    store
        .stage_local_write(PendingOperationDraft::create(
            container(),
            entity("C1"),
            payload(json!({})),
        ))
        .await
        .unwrap();
    store
        .stage_local_write(PendingOperationDraft::create(
            trip(),
            entity("T1"),
            payload(json!({})),
        ))
        .await
        .unwrap();

    let report = service.sync_all().await;
    assert!(report.success);

    // The container group was queued first, so it flushes first.
    assert_eq!(
        remote.calls().await,
        vec![
            ("create".to_string(), "C1".to_string()),
            ("create".to_string(), "T1".to_string()),
        ]
    );
}

#[tokio::test]
async fn auto_sync_on_reconnect_triggers_exactly_once() {
    let store = memory_store().await;
    let remote = MockRemoteTarget::new();
    let registry = registry_with(vec![(trip(), Arc::new(remote.clone()) as _)]);
    let service = SyncService::new(store.clone(), registry);
    let monitor = ConnectivityMonitor::new(true);

    store
        .stage_local_write(PendingOperationDraft::create(
            trip(),
            entity("T1"),
            payload(json!({})),
        ))
        .await
        .unwrap();

    monitor.set_online(false).await;
    monitor.set_online(true).await;

    let report = service.sync_on_reconnect(&monitor).await.unwrap();
    assert_eq!(report.map(|r| r.synced), Some(1));

    // The edge was consumed; steady online state does not re-trigger.
    let report = service.sync_on_reconnect(&monitor).await.unwrap();
    assert!(report.is_none());
}

#[tokio::test]
async fn background_auto_sync_drains_queue_on_reconnect() {
    let store = memory_store().await;
    let remote = MockRemoteTarget::new();
    let registry = registry_with(vec![(trip(), Arc::new(remote.clone()) as _)]);
    let service = SyncService::new(store.clone(), registry);
    let monitor = ConnectivityMonitor::new(true);

    let handle = service.spawn_auto_sync(&monitor);

    store
        .stage_local_write(PendingOperationDraft::create(
            trip(),
            entity("T1"),
            payload(json!({})),
        ))
        .await
        .unwrap();

    monitor.set_online(false).await;
    monitor.set_online(true).await;

    tokio::time::timeout(Duration::from_secs(5), async {
        while store.pending_count().await.unwrap() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("queue should drain after reconnect");

    assert_eq!(remote.calls().await.len(), 1);
    handle.abort();
}

#[tokio::test]
async fn reconnect_with_empty_queue_does_not_flush() {
    let store = memory_store().await;
    let registry = registry_with(vec![]);
    let service = SyncService::new(store.clone(), registry);
    let monitor = ConnectivityMonitor::new(false);

    monitor.set_online(true).await;

    let report = service.sync_on_reconnect(&monitor).await.unwrap();
    assert!(report.is_none());
}

#[tokio::test]
async fn lost_connectivity_mid_flush_leaves_operations_queued() {
    let store = memory_store().await;
    let remote = MockRemoteTarget::new();
    remote.set_offline(true).await;
    let registry = registry_with(vec![(trip(), Arc::new(remote.clone()) as _)]);
    let service = SyncService::new(store.clone(), registry);

    store
        .stage_local_write(PendingOperationDraft::create(
            trip(),
            entity("T1"),
            payload(json!({})),
        ))
        .await
        .unwrap();

    let report = service.sync_all().await;
    assert!(!report.success);
    assert_eq!(report.failed, 1);

    // The backend comes back; the queued operation drains on the next pass.
    remote.set_offline(false).await;
    let report = service.sync_all().await;
    assert!(report.success);
    assert_eq!(store.pending_count().await.unwrap(), 0);
}

#[tokio::test]
async fn status_snapshot_reflects_queue_and_engine_state() {
    let store = memory_store().await;
    let registry = registry_with(vec![]);
    let service = SyncService::new(store.clone(), registry);
    let status = StatusService::new(store.clone(), service.state_handle(), 3);

    assert_eq!(status.pending_count().await.unwrap(), 0);
    assert!(!status.has_pending_sync().await.unwrap());
    assert!(!status.is_syncing().await);

    store
        .stage_local_write(PendingOperationDraft::create(
            trip(),
            entity("T1"),
            payload(json!({})),
        ))
        .await
        .unwrap();
    store
        .stage_local_write(PendingOperationDraft::create(
            container(),
            entity("C1"),
            payload(json!({})),
        ))
        .await
        .unwrap();

    let snapshot = status.snapshot().await.unwrap();
    assert_eq!(snapshot.pending_count, 2);
    assert!(snapshot.has_pending_sync);
    assert!(!snapshot.is_syncing);
    assert_eq!(snapshot.stuck_count, 0);
    assert_eq!(snapshot.per_type.len(), 2);
    assert!(snapshot
        .per_type
        .iter()
        .all(|row| row.pending == 1 && row.status == SyncState::Idle));
}
