//! Shared types for the billing workspace
//!
//! Data model (bills, kitchen orders, line items, tables, principals,
//! receipt contracts) and the unified error types used by every crate.

pub mod error;
pub mod models;
pub mod types;
pub mod util;

// Re-exports
pub use error::{AppError, AppResult, ErrorCode};
pub use serde::{Deserialize, Serialize};
