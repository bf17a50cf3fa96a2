use crate::domain::value_objects::{EntityType, SyncState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Read-only projection for presentation collaborators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusSnapshot {
    pub pending_count: u32,
    pub has_pending_sync: bool,
    pub is_syncing: bool,
    pub stuck_count: u32,
    pub per_type: Vec<EntityTypeStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityTypeStatus {
    pub entity_type: EntityType,
    pub pending: u32,
    pub status: SyncState,
    pub last_sync_at: Option<DateTime<Utc>>,
}
