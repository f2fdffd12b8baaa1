//! Shared types for the Kasir POS client
//!
//! Backend DTOs, client-side order types and the money calculator.
//! Nothing in this crate performs I/O.

pub mod models;
pub mod order;
pub mod response;
pub mod util;

// Re-exports
pub use rust_decimal::Decimal;
pub use serde::{Deserialize, Serialize};

pub use order::{
    CustomerType, DiscountInfo, DiscountKind, HeldOrder, LineItem, OrderRef, PaymentMethod,
    ProductRef, RecalledSnapshot, Totals,
};
pub use response::{ErrorBody, ListEnvelope};
