//! Data models
//!
//! Documents persisted through the document store. Store-assigned document
//! ids are carried in `doc_id` and never serialized into the document body.

pub mod bill;
pub mod dining_table;
pub mod kitchen_order;
pub mod line_item;
pub mod menu_item;
pub mod receipt;
pub mod staff;

// Re-exports
pub use bill::*;
pub use dining_table::*;
pub use kitchen_order::*;
pub use line_item::*;
pub use menu_item::*;
pub use receipt::*;
pub use staff::*;
