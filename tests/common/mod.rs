#![allow(dead_code)]

use async_trait::async_trait;
use fleetsync::{
    EntityId, EntityType, Payload, RemoteError, RemoteSyncTarget, RemoteTargetRegistry,
    SqliteLocalStore,
};
use sqlx::sqlite::SqlitePoolOptions;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

pub async fn memory_store() -> Arc<SqliteLocalStore> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    sqlx::migrate!("./migrations").run(&pool).await.unwrap();

    Arc::new(SqliteLocalStore::new(pool))
}

pub fn trip() -> EntityType {
    EntityType::new("trip".to_string()).unwrap()
}

pub fn container() -> EntityType {
    EntityType::new("container".to_string()).unwrap()
}

pub fn entity(id: &str) -> EntityId {
    EntityId::new(id.to_string()).unwrap()
}

pub fn payload(value: serde_json::Value) -> Payload {
    Payload::new(value).unwrap()
}

pub fn registry_with(entries: Vec<(EntityType, Arc<dyn RemoteSyncTarget>)>) -> RemoteTargetRegistry {
    let mut registry = RemoteTargetRegistry::new();
    for (entity_type, target) in entries {
        registry.register(entity_type, target);
    }
    registry
}

#[derive(Default)]
struct RemoteState {
    calls: Vec<(String, String)>,
    rejections: HashSet<(String, String)>,
    offline: bool,
}

/// In-memory stand-in for a per-entity-type backend endpoint. Records
/// accepted calls and can be told to reject specific operations or to
/// behave as unreachable.
#[derive(Clone, Default)]
pub struct MockRemoteTarget {
    state: Arc<RwLock<RemoteState>>,
    delay: Option<Duration>,
}

impl MockRemoteTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each remote call sleeps first; used to hold a flush open while a
    /// second one is attempted.
    pub fn with_delay(delay_ms: u64) -> Self {
        Self {
            state: Arc::new(RwLock::new(RemoteState::default())),
            delay: Some(Duration::from_millis(delay_ms)),
        }
    }

    pub async fn reject(&self, operation: &str, entity_id: &str) {
        self.state
            .write()
            .await
            .rejections
            .insert((operation.to_string(), entity_id.to_string()));
    }

    pub async fn accept(&self, operation: &str, entity_id: &str) {
        self.state
            .write()
            .await
            .rejections
            .remove(&(operation.to_string(), entity_id.to_string()));
    }

    pub async fn set_offline(&self, offline: bool) {
        self.state.write().await.offline = offline;
    }

    /// Accepted calls as `(operation, entity_id)` pairs, in arrival order.
    pub async fn calls(&self) -> Vec<(String, String)> {
        self.state.read().await.calls.clone()
    }

    async fn apply(&self, operation: &str, entity_id: &EntityId) -> Result<(), RemoteError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().await;
        if state.offline {
            return Err(RemoteError::Unreachable("connection refused".to_string()));
        }
        if state
            .rejections
            .contains(&(operation.to_string(), entity_id.to_string()))
        {
            return Err(RemoteError::Rejected(format!(
                "{operation} {entity_id} rejected by backend"
            )));
        }
        state
            .calls
            .push((operation.to_string(), entity_id.to_string()));
        Ok(())
    }
}

#[async_trait]
impl RemoteSyncTarget for MockRemoteTarget {
    async fn create(&self, entity_id: &EntityId, _payload: &Payload) -> Result<(), RemoteError> {
        self.apply("create", entity_id).await
    }

    async fn update(&self, entity_id: &EntityId, _payload: &Payload) -> Result<(), RemoteError> {
        self.apply("update", entity_id).await
    }

    async fn delete(&self, entity_id: &EntityId) -> Result<(), RemoteError> {
        self.apply("delete", entity_id).await
    }
}
