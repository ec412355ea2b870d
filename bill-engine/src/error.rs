//! Engine error types
//!
//! Every engine error converts into [`shared::error::AppError`] at the
//! operation boundary with a unified [`ErrorCode`].

use crate::store::StoreError;
use receipt_printer::PrintError;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::Section;
use thiserror::Error;

/// Rejected before any write
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please select a table")]
    TableRequired,

    #[error("Please enter the platform order id")]
    PlatformIdRequired,

    #[error("Please add items to the bill")]
    NoItems,

    #[error("No changes to save")]
    NoChanges,

    #[error("A save is already in progress")]
    SaveInProgress,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Invalid payment method: {0}")]
    InvalidPaymentMethod(String),

    #[error("Save the bill before taking payment")]
    UnsavedChanges,

    #[error("No item is waiting for removal confirmation")]
    NoPendingRemoval,

    #[error("Fulfillment type cannot change after the bill is saved")]
    FulfillmentLocked,

    #[error("Table cannot change after the bill is saved")]
    TableLocked,
}

impl ValidationError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::TableRequired => ErrorCode::TableRequired,
            Self::PlatformIdRequired => ErrorCode::PlatformOrderIdRequired,
            Self::NoItems => ErrorCode::BillEmpty,
            Self::NoChanges => ErrorCode::BillNoChanges,
            Self::SaveInProgress => ErrorCode::BillSaveInProgress,
            Self::InvalidAmount(_) | Self::InvalidQuantity(_) => ErrorCode::ValueOutOfRange,
            Self::InvalidPaymentMethod(_) => ErrorCode::PaymentInvalidMethod,
            Self::UnsavedChanges
            | Self::NoPendingRemoval
            | Self::FulfillmentLocked
            | Self::TableLocked => ErrorCode::ValidationFailed,
        }
    }
}

/// One store write that did not go through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedWrite {
    /// e.g. "cancel order abc123"
    pub target: String,
    pub reason: String,
}

/// A multi-document write failed part-way
///
/// Writes that succeeded before the failure were replayed in reverse from
/// the compensation journal. Compensation is best-effort, so the report
/// lists what could not be undone.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error(
    "{} write(s) failed, {} compensated, {} compensation(s) failed",
    .failed.len(),
    .compensated.len(),
    .compensation_failed.len()
)]
pub struct PersistenceError {
    pub failed: Vec<FailedWrite>,
    pub compensated: Vec<String>,
    pub compensation_failed: Vec<FailedWrite>,
}

impl PersistenceError {
    /// Store left exactly as before the operation
    pub fn fully_compensated(&self) -> bool {
        self.compensation_failed.is_empty()
    }
}

/// Identity provider failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Access denied: {0:?}")]
    AccessDenied(Section),

    #[error("Account already exists: {0}")]
    AlreadyRegistered(String),

    #[error("Identity store error: {0}")]
    Backend(String),
}

impl From<StoreError> for IdentityError {
    fn from(err: StoreError) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Billing engine errors
#[derive(Debug, Error)]
pub enum BillingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Amount received {tendered:.2} is less than total {required:.2}")]
    InsufficientPayment { required: f64, tendered: f64 },

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("Bill already settled: {0}")]
    AlreadySettled(String),

    #[error("Bill is closed: {0}")]
    BillClosed(String),

    #[error("Bill not found: {0}")]
    BillNotFound(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Print error: {0}")]
    Print(#[from] PrintError),
}

pub type BillingResult<T> = Result<T, BillingError>;

/// 将存储错误转换为错误码
fn classify_store_error(e: &StoreError) -> ErrorCode {
    match e {
        StoreError::NotFound { .. } => ErrorCode::NotFound,
        StoreError::Serialization(_) | StoreError::InvalidPatch(_) => ErrorCode::InternalError,
        _ => ErrorCode::DatabaseError,
    }
}

impl From<BillingError> for AppError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::Validation(e) => AppError::with_message(e.code(), e.to_string()),
            BillingError::Persistence(e) => {
                tracing::error!(
                    failed = e.failed.len(),
                    compensated = e.compensated.len(),
                    compensation_failed = e.compensation_failed.len(),
                    "Partial write"
                );
                let mut app = AppError::with_message(ErrorCode::PartialWrite, e.to_string())
                    .with_detail("fully_compensated", e.fully_compensated());
                if let Ok(report) = serde_json::to_value(&e) {
                    app = app.with_detail("report", report);
                }
                app
            }
            BillingError::Store(e) => {
                let code = classify_store_error(&e);
                tracing::error!(error = %e, error_code = %code, "Store error occurred");
                AppError::with_message(code, e.to_string())
            }
            BillingError::InsufficientPayment { required, tendered } => {
                AppError::new(ErrorCode::PaymentInsufficientAmount)
                    .with_detail("required", required)
                    .with_detail("tendered", tendered)
            }
            BillingError::Identity(e) => {
                let code = match &e {
                    IdentityError::InvalidCredentials => ErrorCode::InvalidCredentials,
                    IdentityError::UserNotFound => ErrorCode::UserNotFound,
                    IdentityError::NotLoggedIn => ErrorCode::NotAuthenticated,
                    IdentityError::AccessDenied(Section::Dashboard) => ErrorCode::AdminRequired,
                    IdentityError::AccessDenied(_) => ErrorCode::PermissionDenied,
                    IdentityError::AlreadyRegistered(_) => ErrorCode::InvalidRequest,
                    IdentityError::Backend(_) => ErrorCode::DatabaseError,
                };
                AppError::with_message(code, e.to_string())
            }
            BillingError::AlreadySettled(id) => AppError::new(ErrorCode::BillAlreadyPaid)
                .with_detail("bill_doc_id", id),
            BillingError::BillClosed(id) => AppError::new(ErrorCode::BillAlreadyCancelled)
                .with_detail("bill_doc_id", id),
            BillingError::BillNotFound(id) => {
                AppError::new(ErrorCode::BillNotFound).with_detail("bill_doc_id", id)
            }
            BillingError::ItemNotFound(id) => {
                AppError::new(ErrorCode::BillItemNotFound).with_detail("item_id", id)
            }
            BillingError::Print(e) => {
                let code = match &e {
                    PrintError::Offline(_) | PrintError::Connection(_) | PrintError::Timeout(_) => {
                        ErrorCode::PrinterNotAvailable
                    }
                    PrintError::InvalidConfig(_) => ErrorCode::ConfigError,
                    PrintError::Io(_) | PrintError::Serial(_) => ErrorCode::PrintFailed,
                };
                tracing::warn!(error = %e, error_code = %code, "Print error occurred");
                AppError::with_message(code, e.to_string())
            }
        }
    }
}
