//! Dining Table Model

use serde::{Deserialize, Serialize};

/// Dining table entity (桌台)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiningTable {
    #[serde(default, skip_serializing)]
    pub doc_id: String,
    pub name: String,
    /// Short label printed on tickets (e.g. "T4")
    pub short_code: String,
    #[serde(default)]
    pub floor_id: Option<String>,
}

impl DiningTable {
    pub fn new(
        doc_id: impl Into<String>,
        name: impl Into<String>,
        short_code: impl Into<String>,
    ) -> Self {
        Self {
            doc_id: doc_id.into(),
            name: name.into(),
            short_code: short_code.into().to_uppercase(),
            floor_id: None,
        }
    }
}
