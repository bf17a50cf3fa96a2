pub mod entity_id;
pub mod entity_type;
pub mod operation_id;
pub mod operation_kind;
pub mod payload;
pub mod sync_state;

pub use entity_id::EntityId;
pub use entity_type::EntityType;
pub use operation_id::OperationId;
pub use operation_kind::OperationKind;
pub use payload::Payload;
pub use sync_state::SyncState;
