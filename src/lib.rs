//! Offline-first mutation queue and synchronization engine.
//!
//! Local writes land in a durable SQLite-backed store (entity mirror
//! updated optimistically, operation enqueued); once connectivity
//! returns, the sync service drains the queue against per-entity-type
//! remote targets, tolerating partial failure and retrying on the next
//! pass.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;

pub use application::ports::local_store::LocalStore;
pub use application::ports::remote_target::{RemoteError, RemoteSyncTarget, RemoteTargetRegistry};
pub use application::services::connectivity::{ConnectivityEvent, ConnectivityMonitor};
pub use application::services::status_service::StatusService;
pub use application::services::sync_service::{EngineState, SyncService};
pub use domain::entities::{
    EntityMirror, EntityTypeStats, EntityTypeStatus, PendingOperation, PendingOperationDraft,
    QueueStats, StatusSnapshot, SyncMetadata, SyncMetadataUpdate, SyncReport,
};
pub use domain::value_objects::{
    EntityId, EntityType, OperationId, OperationKind, Payload, SyncState,
};
pub use infrastructure::database::connection::{Database, DbPool};
pub use infrastructure::offline::SqliteLocalStore;
pub use shared::config::{AppConfig, DatabaseConfig, SyncConfig};
pub use shared::error::AppError;

/// Install the global tracing subscriber. Call once from the embedding
/// application.
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fleetsync=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
