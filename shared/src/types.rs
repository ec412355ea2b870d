//! Common types for the shared crate

/// Timestamp type (Unix milliseconds)
pub type Timestamp = i64;

/// Placeholder bill reference carried by kitchen orders created before
/// their bill is first persisted. Replaced by the real document id
/// once the bill exists.
pub const PENDING_BILL_REF: &str = "pending";

/// Default customer name when none is entered
pub const DEFAULT_CUSTOMER_NAME: &str = "Guest";
