use crate::domain::value_objects::{EntityId, EntityType, OperationId, OperationKind, Payload};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A durably queued, not-yet-confirmed local mutation intended for the
/// remote backend. Immutable except for its retry bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingOperation {
    pub id: OperationId,
    pub entity_type: EntityType,
    pub entity_id: EntityId,
    pub operation: OperationKind,
    pub payload: Option<Payload>,
    pub created_at: DateTime<Utc>,
    pub retry_count: u32,
    pub last_error: Option<String>,
}

impl PendingOperation {
    pub fn is_stuck(&self, threshold: u32) -> bool {
        self.retry_count > threshold
    }
}

/// Enqueue input. Creates and updates carry a payload, deletes do not;
/// the constructors encode that rule.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingOperationDraft {
    pub entity_type: EntityType,
    pub entity_id: EntityId,
    pub operation: OperationKind,
    pub payload: Option<Payload>,
}

impl PendingOperationDraft {
    pub fn create(entity_type: EntityType, entity_id: EntityId, payload: Payload) -> Self {
        Self {
            entity_type,
            entity_id,
            operation: OperationKind::Create,
            payload: Some(payload),
        }
    }

    pub fn update(entity_type: EntityType, entity_id: EntityId, payload: Payload) -> Self {
        Self {
            entity_type,
            entity_id,
            operation: OperationKind::Update,
            payload: Some(payload),
        }
    }

    pub fn delete(entity_type: EntityType, entity_id: EntityId) -> Self {
        Self {
            entity_type,
            entity_id,
            operation: OperationKind::Delete,
            payload: None,
        }
    }
}
