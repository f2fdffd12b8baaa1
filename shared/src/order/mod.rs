//! Client-side order types
//!
//! - **types**: line items, held orders and the enums the sales screen works with
//! - **money**: subtotal / discount / tax arithmetic on `Decimal`

pub mod money;
pub mod types;

// Re-exports
pub use money::Totals;
pub use types::*;
