use serde::{Deserialize, Serialize};

/// Aggregated outcome of one full flush pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncReport {
    pub success: bool,
    pub synced: u32,
    pub failed: u32,
    pub errors: Vec<String>,
}

impl SyncReport {
    pub fn empty() -> Self {
        Self {
            success: true,
            synced: 0,
            failed: 0,
            errors: Vec::new(),
        }
    }

    pub fn already_syncing() -> Self {
        Self {
            success: false,
            synced: 0,
            failed: 0,
            errors: vec!["sync already in progress".to_string()],
        }
    }

    pub fn fault(message: String) -> Self {
        Self {
            success: false,
            synced: 0,
            failed: 0,
            errors: vec![message],
        }
    }
}
