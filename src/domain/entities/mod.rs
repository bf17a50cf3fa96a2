pub mod entity_mirror;
pub mod pending_operation;
pub mod queue_stats;
pub mod status_snapshot;
pub mod sync_metadata;
pub mod sync_report;

pub use entity_mirror::EntityMirror;
pub use pending_operation::{PendingOperation, PendingOperationDraft};
pub use queue_stats::{EntityTypeStats, QueueStats};
pub use status_snapshot::{EntityTypeStatus, StatusSnapshot};
pub use sync_metadata::{SyncMetadata, SyncMetadataUpdate};
pub use sync_report::SyncReport;
