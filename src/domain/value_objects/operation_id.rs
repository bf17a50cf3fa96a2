use serde::{Deserialize, Serialize};
use std::fmt;

/// Locally-assigned monotonic queue key (SQLite rowid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationId(i64);

impl OperationId {
    pub fn new(value: i64) -> Result<Self, String> {
        if value <= 0 {
            return Err("Operation id must be positive".to_string());
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<OperationId> for i64 {
    fn from(id: OperationId) -> Self {
        id.0
    }
}
