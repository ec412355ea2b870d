//! Unified error codes for the billing workspace
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Bill / kitchen order errors
//! - 5xxx: Payment errors
//! - 7xxx: Table errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so the front-end can map
/// them to localized notifications without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Invalid request
    InvalidRequest = 5,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// User does not exist
    UserNotFound = 1008,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Admin role required
    AdminRequired = 2003,

    // ==================== 4xxx: Bill / Order ====================
    /// Bill not found
    BillNotFound = 4001,
    /// Bill has already been paid
    BillAlreadyPaid = 4002,
    /// Bill has already been cancelled
    BillAlreadyCancelled = 4004,
    /// Line item not found on the bill
    BillItemNotFound = 4006,
    /// Bill has no items
    BillEmpty = 4007,
    /// Nothing changed since the last save
    BillNoChanges = 4008,
    /// A save for this bill is already in flight
    BillSaveInProgress = 4009,
    /// Platform order id missing for an aggregator bill
    PlatformOrderIdRequired = 4010,

    // ==================== 5xxx: Payment ====================
    /// Insufficient payment amount
    PaymentInsufficientAmount = 5002,
    /// Invalid payment method
    PaymentInvalidMethod = 5003,

    // ==================== 7xxx: Table ====================
    /// Dine-in bill requires a table
    TableRequired = 7005,

    // ==================== 9xxx: System ====================
    /// Internal error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9005,
    /// Printer not available
    PrinterNotAvailable = 9201,
    /// Print operation failed
    PrintFailed = 9202,
    /// Partial write: some documents were updated before a failure
    PartialWrite = 9405,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::UserNotFound => "User not found",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::AdminRequired => "Administrator access is required",

            // Bill / Order
            ErrorCode::BillNotFound => "Bill not found",
            ErrorCode::BillAlreadyPaid => "Bill has already been paid",
            ErrorCode::BillAlreadyCancelled => "Bill has already been cancelled",
            ErrorCode::BillItemNotFound => "Bill item not found",
            ErrorCode::BillEmpty => "Please add items to the bill",
            ErrorCode::BillNoChanges => "No changes to save",
            ErrorCode::BillSaveInProgress => "A save is already in progress",
            ErrorCode::PlatformOrderIdRequired => "Platform order id is required",

            // Payment
            ErrorCode::PaymentInsufficientAmount => "Amount received is less than total",
            ErrorCode::PaymentInvalidMethod => "Invalid payment method",

            // Table
            ErrorCode::TableRequired => "Please select a table",

            // System
            ErrorCode::InternalError => "Internal error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::PrinterNotAvailable => "Printer not available",
            ErrorCode::PrintFailed => "Print operation failed",
            ErrorCode::PartialWrite => "Some changes could not be saved",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => ErrorCode::Success,
            2 => ErrorCode::ValidationFailed,
            3 => ErrorCode::NotFound,
            5 => ErrorCode::InvalidRequest,
            8 => ErrorCode::ValueOutOfRange,

            1001 => ErrorCode::NotAuthenticated,
            1002 => ErrorCode::InvalidCredentials,
            1008 => ErrorCode::UserNotFound,

            2001 => ErrorCode::PermissionDenied,
            2003 => ErrorCode::AdminRequired,

            4001 => ErrorCode::BillNotFound,
            4002 => ErrorCode::BillAlreadyPaid,
            4004 => ErrorCode::BillAlreadyCancelled,
            4006 => ErrorCode::BillItemNotFound,
            4007 => ErrorCode::BillEmpty,
            4008 => ErrorCode::BillNoChanges,
            4009 => ErrorCode::BillSaveInProgress,
            4010 => ErrorCode::PlatformOrderIdRequired,

            5002 => ErrorCode::PaymentInsufficientAmount,
            5003 => ErrorCode::PaymentInvalidMethod,

            7005 => ErrorCode::TableRequired,

            9001 => ErrorCode::InternalError,
            9002 => ErrorCode::DatabaseError,
            9005 => ErrorCode::ConfigError,
            9201 => ErrorCode::PrinterNotAvailable,
            9202 => ErrorCode::PrintFailed,
            9405 => ErrorCode::PartialWrite,

            _ => return Err(InvalidErrorCode(value)),
        };
        Ok(code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
