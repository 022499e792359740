use std::fmt::Display;

use market_common::Won;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use toss_tools::TossApiError;

/// The single failure type of the engine. Every public operation returns it, and every variant aborts the enclosing
/// database transaction. Callers that only need to switch on the category should use [`MarketplaceError::kind`].
#[derive(Debug, Clone, Error)]
pub enum MarketplaceError {
    #[error("Article {0} does not exist")]
    ArticleNotFound(String),
    #[error("User {0} does not exist")]
    UserNotFound(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(String),
    #[error("No payment exists for order {0}")]
    PaymentNotFound(String),
    #[error("Receipt {0} does not exist")]
    ReceiptNotFound(String),
    #[error("The card receipt for receipt {0} is missing")]
    CardReceiptNotFound(String),
    #[error("Payment amount mismatch. Expected {expected}, but received {received}")]
    InvalidAmount { expected: Won, received: Won },
    #[error("A cancellation requires a reason")]
    MissingCancelReason,
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),
    #[error("Already processed: {0}")]
    AlreadyProcessed(String),
    #[error("Payment gateway error: {0}")]
    ExternalServiceError(String),
    #[error("Access denied: {0}")]
    AccessDenied(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    ArticleNotFound,
    UserNotFound,
    OrderNotFound,
    PaymentNotFound,
    ReceiptNotFound,
    CardReceiptNotFound,
    InvalidAmount,
    MissingCancelReason,
    InvalidStateTransition,
    AlreadyProcessed,
    ExternalServiceError,
    AccessDenied,
    DatabaseError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl MarketplaceError {
    pub fn kind(&self) -> ErrorKind {
        use MarketplaceError::*;
        match self {
            ArticleNotFound(_) => ErrorKind::ArticleNotFound,
            UserNotFound(_) => ErrorKind::UserNotFound,
            OrderNotFound(_) => ErrorKind::OrderNotFound,
            PaymentNotFound(_) => ErrorKind::PaymentNotFound,
            ReceiptNotFound(_) => ErrorKind::ReceiptNotFound,
            CardReceiptNotFound(_) => ErrorKind::CardReceiptNotFound,
            InvalidAmount { .. } => ErrorKind::InvalidAmount,
            MissingCancelReason => ErrorKind::MissingCancelReason,
            InvalidStateTransition(_) => ErrorKind::InvalidStateTransition,
            AlreadyProcessed(_) => ErrorKind::AlreadyProcessed,
            ExternalServiceError(_) => ErrorKind::ExternalServiceError,
            AccessDenied(_) => ErrorKind::AccessDenied,
            DatabaseError(_) => ErrorKind::DatabaseError,
        }
    }
}

impl From<sqlx::Error> for MarketplaceError {
    fn from(e: sqlx::Error) -> Self {
        MarketplaceError::DatabaseError(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for MarketplaceError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        MarketplaceError::DatabaseError(e.to_string())
    }
}

impl From<TossApiError> for MarketplaceError {
    fn from(e: TossApiError) -> Self {
        MarketplaceError::ExternalServiceError(e.to_string())
    }
}
