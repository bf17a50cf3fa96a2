use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PendingOperationRow {
    pub id: i64,
    pub entity_type: String,
    pub entity_id: String,
    pub operation: String,
    pub payload: Option<String>,
    pub created_at: i64,
    pub retry_count: i32,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SyncMetadataRow {
    pub id: i64,
    pub entity_type: String,
    pub last_sync_at: Option<i64>,
    pub version: i32,
    pub status: String,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EntityMirrorRow {
    pub entity_type: String,
    pub entity_id: String,
    pub data: String,
    pub updated_at: i64,
}
