use crate::domain::value_objects::{EntityId, EntityType, Payload};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Locally cached copy of a remote record used for offline reads.
/// Updated optimistically at write time and authoritatively replaced on
/// the next successful full fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityMirror {
    pub entity_type: EntityType,
    pub entity_id: EntityId,
    pub data: Payload,
    pub updated_at: DateTime<Utc>,
}
