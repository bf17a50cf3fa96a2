use crate::domain::entities::{
    EntityMirror, PendingOperation, PendingOperationDraft, QueueStats, SyncMetadata,
    SyncMetadataUpdate,
};
use crate::domain::value_objects::{EntityId, EntityType, OperationId, Payload};
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Atomic, crash-safe persistence for the pending-operation queue, the
/// per-type sync metadata, and the entity mirrors. Purely local: no
/// network access and no retry logic of its own.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Append a pending operation with a zero retry count. A storage
    /// failure surfaces as an error; the caller's mutation is then not
    /// durably queued.
    async fn enqueue(&self, draft: PendingOperationDraft) -> Result<OperationId, AppError>;

    /// The offline write path: upsert the entity mirror optimistically
    /// (remove it for a delete) and enqueue the operation, in a single
    /// transaction.
    async fn stage_local_write(&self, draft: PendingOperationDraft)
        -> Result<OperationId, AppError>;

    /// Remove exactly one operation. Removing a missing id is a no-op.
    async fn dequeue_on_success(&self, id: OperationId) -> Result<(), AppError>;

    /// Increment the retry count and record the failure; the operation
    /// stays queued.
    async fn mark_failed(&self, id: OperationId, error: &str) -> Result<(), AppError>;

    /// Queued operations, optionally filtered by type, ordered by
    /// `created_at` ascending.
    async fn list_pending(
        &self,
        entity_type: Option<&EntityType>,
    ) -> Result<Vec<PendingOperation>, AppError>;

    async fn pending_count(&self) -> Result<u32, AppError>;

    async fn upsert_metadata(&self, update: SyncMetadataUpdate) -> Result<(), AppError>;

    async fn metadata(&self, entity_type: &EntityType) -> Result<Option<SyncMetadata>, AppError>;

    async fn list_metadata(&self) -> Result<Vec<SyncMetadata>, AppError>;

    async fn queue_stats(&self, stuck_threshold: u32) -> Result<QueueStats, AppError>;

    async fn upsert_mirror(
        &self,
        entity_type: &EntityType,
        entity_id: &EntityId,
        data: Payload,
    ) -> Result<(), AppError>;

    async fn get_mirror(
        &self,
        entity_type: &EntityType,
        entity_id: &EntityId,
    ) -> Result<Option<EntityMirror>, AppError>;

    async fn list_mirrors(&self, entity_type: &EntityType) -> Result<Vec<EntityMirror>, AppError>;

    /// Wholesale replacement after an authoritative remote fetch.
    async fn replace_mirrors(
        &self,
        entity_type: &EntityType,
        records: Vec<(EntityId, Payload)>,
    ) -> Result<(), AppError>;

    async fn evict_mirror(
        &self,
        entity_type: &EntityType,
        entity_id: &EntityId,
    ) -> Result<(), AppError>;

    async fn evict_mirrors(&self, entity_type: &EntityType) -> Result<u32, AppError>;
}
