use crate::domain::entities::{EntityMirror, PendingOperation, SyncMetadata};
use crate::domain::value_objects::{
    EntityId, EntityType, OperationId, OperationKind, Payload, SyncState,
};
use crate::infrastructure::offline::rows::{EntityMirrorRow, PendingOperationRow, SyncMetadataRow};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};

pub fn pending_operation_from_row(row: PendingOperationRow) -> Result<PendingOperation, AppError> {
    let id = OperationId::new(row.id).map_err(AppError::ValidationError)?;
    let entity_type = EntityType::new(row.entity_type).map_err(AppError::ValidationError)?;
    let entity_id = EntityId::new(row.entity_id).map_err(AppError::ValidationError)?;
    let operation = OperationKind::parse(&row.operation).map_err(AppError::ValidationError)?;
    let payload = row
        .payload
        .as_deref()
        .map(Payload::from_json_str)
        .transpose()
        .map_err(AppError::ValidationError)?;

    Ok(PendingOperation {
        id,
        entity_type,
        entity_id,
        operation,
        payload,
        created_at: datetime_from_unix(row.created_at)?,
        retry_count: row.retry_count.max(0) as u32,
        last_error: row.last_error,
    })
}

pub fn sync_metadata_from_row(row: SyncMetadataRow) -> Result<SyncMetadata, AppError> {
    let entity_type = EntityType::new(row.entity_type).map_err(AppError::ValidationError)?;
    let status = SyncState::parse(&row.status).map_err(AppError::ValidationError)?;
    let last_sync_at = row.last_sync_at.map(datetime_from_unix).transpose()?;

    Ok(SyncMetadata {
        entity_type,
        last_sync_at,
        version: row.version.max(0) as u32,
        status,
        error_message: row.error_message,
    })
}

pub fn entity_mirror_from_row(row: EntityMirrorRow) -> Result<EntityMirror, AppError> {
    let entity_type = EntityType::new(row.entity_type).map_err(AppError::ValidationError)?;
    let entity_id = EntityId::new(row.entity_id).map_err(AppError::ValidationError)?;
    let data = Payload::from_json_str(&row.data).map_err(AppError::ValidationError)?;

    Ok(EntityMirror {
        entity_type,
        entity_id,
        data,
        updated_at: datetime_from_unix(row.updated_at)?,
    })
}

fn datetime_from_unix(ts: i64) -> Result<DateTime<Utc>, AppError> {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .ok_or_else(|| AppError::ValidationError(format!("Invalid timestamp: {ts}")))
}
