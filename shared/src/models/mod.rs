//! Backend data models
//!
//! Shapes of the REST backend's JSON. Amounts travel as JSON numbers and are
//! read into `Decimal` through `rust_decimal::serde::float`.

pub mod order;
pub mod product;

// Re-exports
pub use order::*;
pub use product::*;
