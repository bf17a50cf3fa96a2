use crate::application::ports::local_store::LocalStore;
use crate::application::services::sync_service::EngineState;
use crate::domain::entities::{EntityTypeStatus, QueueStats, StatusSnapshot};
use crate::domain::value_objects::SyncState;
use crate::shared::error::AppError;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Read-only projections over the local store for presentation
/// collaborators. No side effects.
pub struct StatusService {
    store: Arc<dyn LocalStore>,
    sync_state: Arc<RwLock<EngineState>>,
    stuck_threshold: u32,
}

impl StatusService {
    pub fn new(
        store: Arc<dyn LocalStore>,
        sync_state: Arc<RwLock<EngineState>>,
        stuck_threshold: u32,
    ) -> Self {
        Self {
            store,
            sync_state,
            stuck_threshold,
        }
    }

    pub async fn pending_count(&self) -> Result<u32, AppError> {
        self.store.pending_count().await
    }

    pub async fn has_pending_sync(&self) -> Result<bool, AppError> {
        Ok(self.store.pending_count().await? > 0)
    }

    pub async fn is_syncing(&self) -> bool {
        *self.sync_state.read().await == EngineState::Syncing
    }

    pub async fn queue_stats(&self) -> Result<QueueStats, AppError> {
        self.store.queue_stats(self.stuck_threshold).await
    }

    pub async fn snapshot(&self) -> Result<StatusSnapshot, AppError> {
        let stats = self.store.queue_stats(self.stuck_threshold).await?;
        let metadata = self.store.list_metadata().await?;

        // Every type with metadata shows up, plus any type that has queued
        // work but no metadata row yet.
        let mut per_type: Vec<EntityTypeStatus> = metadata
            .iter()
            .map(|meta| {
                let pending = stats
                    .per_type
                    .iter()
                    .find(|s| s.entity_type == meta.entity_type)
                    .map(|s| s.count)
                    .unwrap_or(0);
                EntityTypeStatus {
                    entity_type: meta.entity_type.clone(),
                    pending,
                    status: meta.status,
                    last_sync_at: meta.last_sync_at,
                }
            })
            .collect();

        for stat in &stats.per_type {
            if !per_type.iter().any(|s| s.entity_type == stat.entity_type) {
                per_type.push(EntityTypeStatus {
                    entity_type: stat.entity_type.clone(),
                    pending: stat.count,
                    status: SyncState::Idle,
                    last_sync_at: None,
                });
            }
        }

        Ok(StatusSnapshot {
            pending_count: stats.total,
            has_pending_sync: stats.total > 0,
            is_syncing: self.is_syncing().await,
            stuck_count: stats.stuck,
            per_type,
        })
    }
}
