//! Kasir Client - sales-screen core for the Kasir POS backend
//!
//! Order draft, held-order reconciliation and the checkout lifecycle, on top
//! of a bearer-token REST client and a local held-order cache.

pub mod api;
pub mod auth;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod draft;
pub mod error;
pub mod held;
pub mod http;
pub mod lifecycle;

#[cfg(test)]
mod testing;

pub use api::{CatalogApi, OrdersApi};
pub use auth::{Identity, StaticIdentity, TokenIdentity};
pub use cache::{CacheError, CacheResult, HeldOrderCache, KeyValueStore, MemoryStore, RedbStore};
pub use config::ClientConfig;
pub use draft::OrderDraft;
pub use error::{ClientError, ClientResult, ErrorKind, PosError, PosResult};
pub use held::{HeldListing, HeldOrderReconciler, HeldPage};
pub use http::HttpClient;
pub use lifecycle::{CheckoutStep, OrderController, OrderPhase, Receipt};

// Re-export shared types for convenience
pub use shared::{
    CustomerType, Decimal, DiscountInfo, DiscountKind, HeldOrder, LineItem, OrderRef,
    PaymentMethod, Totals,
};
