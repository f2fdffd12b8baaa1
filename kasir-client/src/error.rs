//! Client error types

use crate::cache::CacheError;
use shared::OrderRef;
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication required
    #[error("Authentication required: {0}")]
    Unauthorized(String),

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Any other non-2xx response
    #[error("{0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// How an error is meant to be handled by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected locally before any backend call
    Validation,
    /// Backend or local store call failed; nothing was committed
    Backend,
    /// Data came back in a shape the sale cannot continue with
    Integrity,
}

/// Sales-screen error
#[derive(Debug, Error)]
pub enum PosError {
    #[error("Order is empty")]
    EmptyOrder,

    #[error("User ID not found. Please log in again.")]
    MissingUser,

    #[error("Order is locked")]
    OrderLocked,

    #[error("Product {0} is inactive")]
    ProductInactive(u64),

    #[error("A recalled order cannot be held again")]
    RecallInProgress,

    #[error("Action not allowed in the {0} step")]
    InvalidStep(&'static str),

    #[error("Held order {0} not found")]
    HeldOrderNotFound(OrderRef),

    #[error("Order has no items")]
    EmptyRecall(OrderRef),

    #[error(transparent)]
    Backend(#[from] ClientError),

    #[error("Local cache error: {0}")]
    Cache(#[from] CacheError),
}

impl PosError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyOrder
            | Self::MissingUser
            | Self::OrderLocked
            | Self::ProductInactive(_)
            | Self::RecallInProgress
            | Self::InvalidStep(_) => ErrorKind::Validation,
            Self::Backend(_) | Self::Cache(_) => ErrorKind::Backend,
            Self::HeldOrderNotFound(_) | Self::EmptyRecall(_) => ErrorKind::Integrity,
        }
    }
}

/// Result type for sales-screen operations
pub type PosResult<T> = Result<T, PosError>;
