use crate::domain::value_objects::{EntityId, EntityType, Payload};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Failures surfaced by a remote target. The engine treats every variant
/// as retryable; a rejected operation stays queued until a later attempt
/// succeeds.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Remote rejected the operation: {0}")]
    Rejected(String),

    #[error("Remote unreachable: {0}")]
    Unreachable(String),
}

/// Per-entity-type resource endpoint: insert by payload, patch by id,
/// delete by id.
#[async_trait]
pub trait RemoteSyncTarget: Send + Sync {
    async fn create(&self, entity_id: &EntityId, payload: &Payload) -> Result<(), RemoteError>;
    async fn update(&self, entity_id: &EntityId, payload: &Payload) -> Result<(), RemoteError>;
    async fn delete(&self, entity_id: &EntityId) -> Result<(), RemoteError>;
}

/// Lookup table selecting the target for an entity type, in place of a
/// growing conditional chain over type strings.
#[derive(Clone, Default)]
pub struct RemoteTargetRegistry {
    targets: HashMap<EntityType, Arc<dyn RemoteSyncTarget>>,
}

impl RemoteTargetRegistry {
    pub fn new() -> Self {
        Self {
            targets: HashMap::new(),
        }
    }

    pub fn register(&mut self, entity_type: EntityType, target: Arc<dyn RemoteSyncTarget>) {
        self.targets.insert(entity_type, target);
    }

    pub fn get(&self, entity_type: &EntityType) -> Option<Arc<dyn RemoteSyncTarget>> {
        self.targets.get(entity_type).cloned()
    }

    pub fn is_registered(&self, entity_type: &EntityType) -> bool {
        self.targets.contains_key(entity_type)
    }
}
