//! Menu Item Model

use serde::{Deserialize, Serialize};

/// Menu item as offered for sale
///
/// Line items copy `name`, `price` and `item_type` at the moment the item
/// is added, so later menu edits never change an open bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    #[serde(default, skip_serializing)]
    pub doc_id: String,
    pub name: String,
    pub price: f64,
    /// Dietary / kitchen tag (e.g. "veg", "non-veg")
    #[serde(default, rename = "type")]
    pub item_type: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}
