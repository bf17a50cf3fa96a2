use crate::application::ports::local_store::LocalStore;
use crate::application::ports::remote_target::RemoteTargetRegistry;
use crate::application::services::connectivity::{ConnectivityEvent, ConnectivityMonitor};
use crate::domain::entities::{PendingOperation, SyncMetadataUpdate, SyncReport};
use crate::domain::value_objects::{EntityId, EntityType, OperationKind, SyncState};
use crate::shared::error::AppError;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Engine-wide flush state. There is exactly one instance per process;
/// `sync_all` entry and exit are the only transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Syncing,
}

/// Orchestrates draining the pending-operation queue against the remote
/// backend: groups by entity type, dispatches sequentially, records
/// per-operation success or failure, and reports the aggregate.
pub struct SyncService {
    store: Arc<dyn LocalStore>,
    targets: RemoteTargetRegistry,
    state: Arc<RwLock<EngineState>>,
}

impl SyncService {
    pub fn new(store: Arc<dyn LocalStore>, targets: RemoteTargetRegistry) -> Self {
        Self {
            store,
            targets,
            state: Arc::new(RwLock::new(EngineState::Idle)),
        }
    }

    /// Shared handle for read-only status consumers.
    pub fn state_handle(&self) -> Arc<RwLock<EngineState>> {
        self.state.clone()
    }

    pub async fn is_syncing(&self) -> bool {
        *self.state.read().await == EngineState::Syncing
    }

    /// Drain the full pending queue. At most one flush runs at a time; a
    /// call made while another is in progress returns immediately with a
    /// recognizable "already syncing" report.
    pub async fn sync_all(&self) -> SyncReport {
        {
            let mut state = self.state.write().await;
            if *state == EngineState::Syncing {
                debug!("Sync requested while a flush is in progress");
                return SyncReport::already_syncing();
            }
            *state = EngineState::Syncing;
        }

        let report = match self.flush_queue().await {
            Ok(report) => report,
            Err(err) => {
                error!("Sync pass aborted: {}", err);
                self.mark_interrupted(&err).await;
                SyncReport::fault(err.to_string())
            }
        };

        *self.state.write().await = EngineState::Idle;
        report
    }

    /// Best-effort cleanup after an aborted flush: no entity type is left
    /// in the `syncing` state.
    async fn mark_interrupted(&self, err: &AppError) {
        let metadata = match self.store.list_metadata().await {
            Ok(metadata) => metadata,
            Err(list_err) => {
                warn!("Could not read metadata after aborted flush: {}", list_err);
                return;
            }
        };
        for meta in metadata {
            if meta.status != SyncState::Syncing {
                continue;
            }
            if let Err(update_err) = self
                .store
                .upsert_metadata(SyncMetadataUpdate::error(meta.entity_type, err.to_string()))
                .await
            {
                warn!(
                    "Could not record aborted flush in metadata: {}",
                    update_err
                );
            }
        }
    }

    async fn flush_queue(&self) -> Result<SyncReport, AppError> {
        let pending = self.store.list_pending(None).await?;
        if pending.is_empty() {
            return Ok(SyncReport::empty());
        }

        info!("Draining {} pending operations", pending.len());

        let mut report = SyncReport::empty();
        // Scoped to this flush: no two operations for the same record are
        // dispatched concurrently within one pass.
        let mut in_flight: HashSet<EntityId> = HashSet::new();

        for (entity_type, operations) in group_by_entity_type(pending) {
            self.store
                .upsert_metadata(SyncMetadataUpdate::syncing(entity_type.clone()))
                .await?;

            let mut group_synced = 0u32;
            let mut group_errors: Vec<String> = Vec::new();

            for op in operations {
                if !in_flight.insert(op.entity_id.clone()) {
                    debug!(
                        "Operation {} for {} already in flight, leaving it queued",
                        op.id, op.entity_id
                    );
                    continue;
                }
                let outcome = self.dispatch(&entity_type, &op).await;
                in_flight.remove(&op.entity_id);

                match outcome {
                    Ok(()) => {
                        self.store.dequeue_on_success(op.id).await?;
                        group_synced += 1;
                    }
                    Err(message) => {
                        self.store.mark_failed(op.id, &message).await?;
                        warn!("Operation {} failed: {}", op.id, message);
                        group_errors.push(message);
                    }
                }
            }

            if group_errors.is_empty() {
                self.store
                    .upsert_metadata(SyncMetadataUpdate::idle(
                        entity_type.clone(),
                        group_synced > 0,
                    ))
                    .await?;
            } else {
                self.store
                    .upsert_metadata(SyncMetadataUpdate::error(
                        entity_type.clone(),
                        group_errors.join("; "),
                    ))
                    .await?;
            }

            report.synced += group_synced;
            report.failed += group_errors.len() as u32;
            report.errors.extend(group_errors);
        }

        report.success = report.failed == 0;
        info!(
            "Flush complete: {} synced, {} failed",
            report.synced, report.failed
        );
        Ok(report)
    }

    async fn dispatch(
        &self,
        entity_type: &EntityType,
        op: &PendingOperation,
    ) -> Result<(), String> {
        let Some(target) = self.targets.get(entity_type) else {
            return Err(format!(
                "no remote target registered for entity type {entity_type}"
            ));
        };

        let result = match op.operation {
            OperationKind::Create => match &op.payload {
                Some(payload) => target.create(&op.entity_id, payload).await,
                None => return Err(format!("create operation {} has no payload", op.id)),
            },
            OperationKind::Update => match &op.payload {
                Some(payload) => target.update(&op.entity_id, payload).await,
                None => return Err(format!("update operation {} has no payload", op.id)),
            },
            OperationKind::Delete => target.delete(&op.entity_id).await,
        };

        result.map_err(|err| err.to_string())
    }

    /// Flush once per consumed reconnect edge, and only when there is
    /// pending work. Returns `None` when nothing was triggered.
    pub async fn sync_on_reconnect(
        &self,
        monitor: &ConnectivityMonitor,
    ) -> Result<Option<SyncReport>, AppError> {
        if !monitor.take_reconnected().await {
            return Ok(None);
        }
        if self.store.pending_count().await? == 0 {
            info!("Reconnected with an empty queue, nothing to sync");
            return Ok(None);
        }
        Ok(Some(self.sync_all().await))
    }

    /// Background task flushing the queue whenever connectivity returns.
    pub fn spawn_auto_sync(&self, monitor: &ConnectivityMonitor) -> tokio::task::JoinHandle<()> {
        let service = self.clone();
        let mut events = monitor.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(ConnectivityEvent::Reconnected) => {
                        match service.store.pending_count().await {
                            Ok(0) => {}
                            Ok(count) => {
                                info!("Reconnected with {} pending operations", count);
                                let report = service.sync_all().await;
                                info!(
                                    "Auto-sync finished: {} synced, {} failed",
                                    report.synced, report.failed
                                );
                            }
                            Err(err) => error!("Auto-sync skipped: {}", err),
                        }
                    }
                    Ok(_) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Connectivity events lagged by {}", skipped);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Background task flushing the queue on a fixed interval while work
    /// is pending.
    pub fn spawn_periodic_sync(&self, interval_secs: u64) -> tokio::task::JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(tokio::time::Duration::from_secs(interval_secs));
            loop {
                interval.tick().await;
                match service.store.pending_count().await {
                    Ok(0) => {}
                    Ok(_) => {
                        let report = service.sync_all().await;
                        if !report.success {
                            warn!(
                                "Periodic sync left {} operations queued: {}",
                                report.failed,
                                report.errors.join("; ")
                            );
                        }
                    }
                    Err(err) => error!("Periodic sync skipped: {}", err),
                }
            }
        })
    }
}

impl Clone for SyncService {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            targets: self.targets.clone(),
            state: self.state.clone(),
        }
    }
}

/// Group the queue by entity type, preserving `created_at` order inside a
/// group. Groups come out in order of their oldest operation, since the
/// input is already sorted.
fn group_by_entity_type(
    operations: Vec<PendingOperation>,
) -> Vec<(EntityType, Vec<PendingOperation>)> {
    let mut groups: Vec<(EntityType, Vec<PendingOperation>)> = Vec::new();
    for op in operations {
        match groups.iter().position(|(ty, _)| *ty == op.entity_type) {
            Some(index) => groups[index].1.push(op),
            None => groups.push((op.entity_type.clone(), vec![op])),
        }
    }
    groups
}
