use crate::domain::value_objects::{EntityType, SyncState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row per entity type. `version` is bumped only on transition into
/// `Idle` after a non-empty successful flush and is used to detect
/// staleness of cached reads, not for conflict resolution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncMetadata {
    pub entity_type: EntityType,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub version: u32,
    pub status: SyncState,
    pub error_message: Option<String>,
}

/// Upsert input for the metadata table.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncMetadataUpdate {
    pub entity_type: EntityType,
    pub status: SyncState,
    pub error_message: Option<String>,
    pub bump_version: bool,
}

impl SyncMetadataUpdate {
    pub fn syncing(entity_type: EntityType) -> Self {
        Self {
            entity_type,
            status: SyncState::Syncing,
            error_message: None,
            bump_version: false,
        }
    }

    pub fn idle(entity_type: EntityType, bump_version: bool) -> Self {
        Self {
            entity_type,
            status: SyncState::Idle,
            error_message: None,
            bump_version,
        }
    }

    pub fn error(entity_type: EntityType, message: String) -> Self {
        Self {
            entity_type,
            status: SyncState::Error,
            error_message: Some(message),
            bump_version: false,
        }
    }
}
