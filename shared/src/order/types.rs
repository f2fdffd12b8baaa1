//! Types for the order being built and for held orders

use crate::models::Product;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::money;

// ============================================================================
// Order Reference
// ============================================================================

/// Identity of a held order across the backend and the local cache.
///
/// `Synced` orders were created on the backend and are addressed by its id.
/// `Local` orders only exist in the client cache and were never accepted by
/// the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "source", content = "id", rename_all = "snake_case")]
pub enum OrderRef {
    Synced(u64),
    Local(String),
}

impl OrderRef {
    /// Fresh local-only reference
    pub fn new_local() -> Self {
        Self::Local(format!("local-{}", uuid::Uuid::new_v4()))
    }

    /// Backend id, if the order is known to the backend
    pub fn server_id(&self) -> Option<u64> {
        match self {
            Self::Synced(id) => Some(*id),
            Self::Local(_) => None,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }
}

impl fmt::Display for OrderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Synced(id) => write!(f, "{}", id),
            Self::Local(id) => f.write_str(id),
        }
    }
}

impl From<u64> for OrderRef {
    fn from(id: u64) -> Self {
        Self::Synced(id)
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Channel an order comes from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CustomerType {
    /// Not chosen yet
    #[default]
    Unset,
    DineIn,
    Grab,
    Gojek,
    Shopee,
}

impl CustomerType {
    /// Map a backend `order_type` (any case). Unknown values fall back to dine-in.
    pub fn from_order_type(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "grab" => Self::Grab,
            "gojek" => Self::Gojek,
            "shopee" => Self::Shopee,
            _ => Self::DineIn,
        }
    }

    /// Value sent as `order_type`. An unset type is submitted as dine-in.
    pub fn as_order_type(&self) -> &'static str {
        match self {
            Self::Unset | Self::DineIn => "DINE-IN",
            Self::Grab => "GRAB",
            Self::Gojek => "GOJEK",
            Self::Shopee => "SHOPEE",
        }
    }
}

/// Payment method chosen at checkout
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Qris,
    Transfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Qris => "qris",
            Self::Transfer => "transfer",
        }
    }
}

/// Order-level discount type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    #[default]
    Percentage,
    /// Fixed amount in rupiah
    Nominal,
}

/// Order-level discount as typed by the cashier.
///
/// `value` is kept as entered; a blank or non-numeric value means no discount.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DiscountInfo {
    #[serde(rename = "type")]
    pub kind: DiscountKind,
    pub value: String,
}

impl DiscountInfo {
    pub fn new(kind: DiscountKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    pub fn percentage(value: impl Into<String>) -> Self {
        Self::new(DiscountKind::Percentage, value)
    }

    pub fn nominal(value: impl Into<String>) -> Self {
        Self::new(DiscountKind::Nominal, value)
    }
}

// ============================================================================
// Line Items
// ============================================================================

/// Product snapshot carried by a line item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductRef {
    pub id: u64,
    pub name: String,
    pub unit_price: Decimal,
    /// Per-product discount percentage (0-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<Decimal>,
}

impl ProductRef {
    /// Unit price after the per-product discount
    pub fn effective_price(&self) -> Decimal {
        money::discounted_unit_price(self.unit_price, self.discount_percent)
    }
}

impl From<&Product> for ProductRef {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            unit_price: product.price,
            discount_percent: product.discount.filter(|d| !d.is_zero()),
        }
    }
}

/// One product row in an order.
///
/// `quantity` is at least 1 and `subtotal` always equals
/// `effective_price × quantity`; both are maintained through the methods below.
/// Deserialized items go through [`LineItem::new`] so the same holds for
/// cached data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "LineItemRecord")]
pub struct LineItem {
    pub product: ProductRef,
    quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    subtotal: Decimal,
}

/// Stored form of a line item; `subtotal` is recomputed on load
#[derive(Deserialize)]
struct LineItemRecord {
    product: ProductRef,
    quantity: u32,
    #[serde(default)]
    note: Option<String>,
}

impl From<LineItemRecord> for LineItem {
    fn from(record: LineItemRecord) -> Self {
        let mut item = LineItem::new(record.product, record.quantity);
        if let Some(note) = record.note {
            item.set_note(note);
        }
        item
    }
}

impl LineItem {
    /// Create a line item. A zero quantity is raised to 1.
    pub fn new(product: ProductRef, quantity: u32) -> Self {
        let quantity = quantity.max(1);
        let subtotal =
            money::line_subtotal(product.unit_price, product.discount_percent, quantity);
        Self {
            product,
            quantity,
            note: None,
            subtotal,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.set_note(note);
        self
    }

    pub fn product_id(&self) -> u64 {
        self.product.id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    /// Set the quantity. Returns `false` (and leaves the item untouched) for zero,
    /// since an item at zero must be removed instead.
    pub fn set_quantity(&mut self, quantity: u32) -> bool {
        if quantity == 0 {
            return false;
        }
        self.quantity = quantity;
        self.subtotal = money::line_subtotal(
            self.product.unit_price,
            self.product.discount_percent,
            quantity,
        );
        true
    }

    /// Attach a note; blank text clears it
    pub fn set_note(&mut self, note: impl Into<String>) {
        let note = note.into();
        self.note = if note.trim().is_empty() { None } else { Some(note) };
    }
}

// ============================================================================
// Held Orders
// ============================================================================

/// An order parked as "unpaid" (an open tab)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeldOrder {
    pub id: OrderRef,
    pub items: Vec<LineItem>,
    pub customer_type: CustomerType,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_info: Option<DiscountInfo>,
}

impl HeldOrder {
    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity()).sum()
    }
}

/// Persisted pointer to the order currently recalled into the draft
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecalledSnapshot {
    pub order: OrderRef,
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub customer_type: CustomerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_info: Option<DiscountInfo>,
}
