use crate::domain::value_objects::EntityType;
use serde::{Deserialize, Serialize};

/// Aggregate queue counts for UI consumption.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueStats {
    pub total: u32,
    /// Operations whose retry count exceeds the configured threshold.
    pub stuck: u32,
    pub per_type: Vec<EntityTypeStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntityTypeStats {
    pub entity_type: EntityType,
    pub count: u32,
}
