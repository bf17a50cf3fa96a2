use crate::application::ports::local_store::LocalStore;
use crate::domain::entities::{
    EntityMirror, EntityTypeStats, PendingOperation, PendingOperationDraft, QueueStats,
    SyncMetadata, SyncMetadataUpdate,
};
use crate::domain::value_objects::{EntityId, EntityType, OperationId, OperationKind, Payload};
use crate::infrastructure::offline::mappers::{
    entity_mirror_from_row, pending_operation_from_row, sync_metadata_from_row,
};
use crate::infrastructure::offline::rows::{EntityMirrorRow, PendingOperationRow, SyncMetadataRow};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::{Pool, Row, Sqlite, SqliteConnection};

/// SQLx-backed implementation of [`LocalStore`].
pub struct SqliteLocalStore {
    pool: Pool<Sqlite>,
}

impl SqliteLocalStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    async fn insert_operation(
        conn: &mut SqliteConnection,
        draft: &PendingOperationDraft,
        created_at: i64,
    ) -> Result<i64, AppError> {
        let payload = draft
            .payload
            .as_ref()
            .map(|p| serde_json::to_string(p.as_json()))
            .transpose()?;

        let result = sqlx::query(
            r#"
            INSERT INTO pending_operations (
                entity_type, entity_id, operation, payload, created_at, retry_count
            ) VALUES (?1, ?2, ?3, ?4, ?5, 0)
            "#,
        )
        .bind(draft.entity_type.as_str())
        .bind(draft.entity_id.as_str())
        .bind(draft.operation.as_str())
        .bind(payload)
        .bind(created_at)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn upsert_mirror_row(
        conn: &mut SqliteConnection,
        entity_type: &EntityType,
        entity_id: &EntityId,
        data: String,
        updated_at: i64,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO entity_mirrors (entity_type, entity_id, data, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(entity_type, entity_id) DO UPDATE SET
                data = excluded.data,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(entity_type.as_str())
        .bind(entity_id.as_str())
        .bind(data)
        .bind(updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

/// Shallow-merge an update patch into the existing mirror data. Falls back
/// to the patch itself when there is no mirror yet or either side is not a
/// JSON object.
fn merged_mirror_data(
    existing: Option<&str>,
    operation: OperationKind,
    payload: &Payload,
) -> Result<String, AppError> {
    if operation == OperationKind::Update {
        if let Some(raw) = existing {
            let mut base: Value = serde_json::from_str(raw)?;
            if let (Value::Object(base_map), Value::Object(patch)) = (&mut base, payload.as_json())
            {
                for (key, value) in patch {
                    base_map.insert(key.clone(), value.clone());
                }
                return Ok(serde_json::to_string(&base)?);
            }
        }
    }
    Ok(serde_json::to_string(payload.as_json())?)
}

#[async_trait]
impl LocalStore for SqliteLocalStore {
    async fn enqueue(&self, draft: PendingOperationDraft) -> Result<OperationId, AppError> {
        let created_at = Utc::now().timestamp();
        let mut conn = self.pool.acquire().await?;
        let id = Self::insert_operation(&mut conn, &draft, created_at).await?;
        OperationId::new(id).map_err(AppError::ValidationError)
    }

    async fn stage_local_write(
        &self,
        draft: PendingOperationDraft,
    ) -> Result<OperationId, AppError> {
        let now = Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        match draft.operation {
            OperationKind::Delete => {
                sqlx::query("DELETE FROM entity_mirrors WHERE entity_type = ?1 AND entity_id = ?2")
                    .bind(draft.entity_type.as_str())
                    .bind(draft.entity_id.as_str())
                    .execute(&mut *tx)
                    .await?;
            }
            OperationKind::Create | OperationKind::Update => {
                let payload = draft.payload.as_ref().ok_or_else(|| {
                    AppError::InvalidInput(format!(
                        "{} operation requires a payload",
                        draft.operation
                    ))
                })?;
                let existing = sqlx::query_scalar::<_, String>(
                    "SELECT data FROM entity_mirrors WHERE entity_type = ?1 AND entity_id = ?2",
                )
                .bind(draft.entity_type.as_str())
                .bind(draft.entity_id.as_str())
                .fetch_optional(&mut *tx)
                .await?;
                let data = merged_mirror_data(existing.as_deref(), draft.operation, payload)?;
                Self::upsert_mirror_row(&mut tx, &draft.entity_type, &draft.entity_id, data, now)
                    .await?;
            }
        }

        let id = Self::insert_operation(&mut tx, &draft, now).await?;
        tx.commit().await?;

        OperationId::new(id).map_err(AppError::ValidationError)
    }

    async fn dequeue_on_success(&self, id: OperationId) -> Result<(), AppError> {
        // Idempotent: deleting a missing id affects zero rows.
        sqlx::query("DELETE FROM pending_operations WHERE id = ?1")
            .bind(id.value())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_failed(&self, id: OperationId, error: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE pending_operations
            SET retry_count = retry_count + 1, last_error = ?1
            WHERE id = ?2
            "#,
        )
        .bind(error)
        .bind(id.value())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_pending(
        &self,
        entity_type: Option<&EntityType>,
    ) -> Result<Vec<PendingOperation>, AppError> {
        let rows = match entity_type {
            Some(entity_type) => {
                sqlx::query_as::<_, PendingOperationRow>(
                    r#"
                    SELECT * FROM pending_operations
                    WHERE entity_type = ?1
                    ORDER BY created_at ASC, id ASC
                    "#,
                )
                .bind(entity_type.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, PendingOperationRow>(
                    "SELECT * FROM pending_operations ORDER BY created_at ASC, id ASC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(pending_operation_from_row).collect()
    }

    async fn pending_count(&self) -> Result<u32, AppError> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM pending_operations")
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.try_get("count")?;
        Ok(count.max(0) as u32)
    }

    async fn upsert_metadata(&self, update: SyncMetadataUpdate) -> Result<(), AppError> {
        let now = Utc::now().timestamp();
        let bump = i64::from(update.bump_version);

        sqlx::query(
            r#"
            INSERT INTO sync_metadata (entity_type, last_sync_at, version, status, error_message)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(entity_type) DO UPDATE SET
                last_sync_at = excluded.last_sync_at,
                version = version + excluded.version,
                status = excluded.status,
                error_message = excluded.error_message
            "#,
        )
        .bind(update.entity_type.as_str())
        .bind(now)
        .bind(bump)
        .bind(update.status.as_str())
        .bind(&update.error_message)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn metadata(&self, entity_type: &EntityType) -> Result<Option<SyncMetadata>, AppError> {
        let row = sqlx::query_as::<_, SyncMetadataRow>(
            "SELECT * FROM sync_metadata WHERE entity_type = ?1",
        )
        .bind(entity_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(sync_metadata_from_row).transpose()
    }

    async fn list_metadata(&self) -> Result<Vec<SyncMetadata>, AppError> {
        let rows =
            sqlx::query_as::<_, SyncMetadataRow>("SELECT * FROM sync_metadata ORDER BY entity_type")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(sync_metadata_from_row).collect()
    }

    async fn queue_stats(&self, stuck_threshold: u32) -> Result<QueueStats, AppError> {
        let total_row = sqlx::query("SELECT COUNT(*) as count FROM pending_operations")
            .fetch_one(&self.pool)
            .await?;
        let total: i64 = total_row.try_get("count")?;

        let stuck_row =
            sqlx::query("SELECT COUNT(*) as count FROM pending_operations WHERE retry_count > ?1")
                .bind(i64::from(stuck_threshold))
                .fetch_one(&self.pool)
                .await?;
        let stuck: i64 = stuck_row.try_get("count")?;

        let per_type_rows = sqlx::query(
            r#"
            SELECT entity_type, COUNT(*) as count
            FROM pending_operations
            GROUP BY entity_type
            ORDER BY entity_type
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut per_type = Vec::with_capacity(per_type_rows.len());
        for row in per_type_rows {
            let entity_type: String = row.try_get("entity_type")?;
            let count: i64 = row.try_get("count")?;
            per_type.push(EntityTypeStats {
                entity_type: EntityType::new(entity_type).map_err(AppError::ValidationError)?,
                count: count.max(0) as u32,
            });
        }

        Ok(QueueStats {
            total: total.max(0) as u32,
            stuck: stuck.max(0) as u32,
            per_type,
        })
    }

    async fn upsert_mirror(
        &self,
        entity_type: &EntityType,
        entity_id: &EntityId,
        data: Payload,
    ) -> Result<(), AppError> {
        let now = Utc::now().timestamp();
        let data = serde_json::to_string(data.as_json())?;
        let mut conn = self.pool.acquire().await?;
        Self::upsert_mirror_row(&mut conn, entity_type, entity_id, data, now).await
    }

    async fn get_mirror(
        &self,
        entity_type: &EntityType,
        entity_id: &EntityId,
    ) -> Result<Option<EntityMirror>, AppError> {
        let row = sqlx::query_as::<_, EntityMirrorRow>(
            "SELECT * FROM entity_mirrors WHERE entity_type = ?1 AND entity_id = ?2",
        )
        .bind(entity_type.as_str())
        .bind(entity_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(entity_mirror_from_row).transpose()
    }

    async fn list_mirrors(&self, entity_type: &EntityType) -> Result<Vec<EntityMirror>, AppError> {
        let rows = sqlx::query_as::<_, EntityMirrorRow>(
            "SELECT * FROM entity_mirrors WHERE entity_type = ?1 ORDER BY entity_id",
        )
        .bind(entity_type.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(entity_mirror_from_row).collect()
    }

    async fn replace_mirrors(
        &self,
        entity_type: &EntityType,
        records: Vec<(EntityId, Payload)>,
    ) -> Result<(), AppError> {
        let now = Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM entity_mirrors WHERE entity_type = ?1")
            .bind(entity_type.as_str())
            .execute(&mut *tx)
            .await?;

        for (entity_id, payload) in records {
            let data = serde_json::to_string(payload.as_json())?;
            Self::upsert_mirror_row(&mut tx, entity_type, &entity_id, data, now).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn evict_mirror(
        &self,
        entity_type: &EntityType,
        entity_id: &EntityId,
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM entity_mirrors WHERE entity_type = ?1 AND entity_id = ?2")
            .bind(entity_type.as_str())
            .bind(entity_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn evict_mirrors(&self, entity_type: &EntityType) -> Result<u32, AppError> {
        let result = sqlx::query("DELETE FROM entity_mirrors WHERE entity_type = ?1")
            .bind(entity_type.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() as u32)
    }
}
