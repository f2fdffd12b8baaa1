//! Order Model

use crate::order::{CustomerType, LineItem, PaymentMethod};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Row limit used when listing orders
pub const DEFAULT_LIST_LIMIT: u32 = 10_000;

/// Payment status of a backend order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Held order (open tab)
    #[default]
    Unpaid,
    Paid,
    #[serde(alias = "cancelled")]
    Canceled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
            Self::Canceled => "canceled",
        }
    }
}

/// Order row as returned by `GET /orders`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: u64,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub order_type: String,
    /// Total amount in rupiah
    #[serde(default, with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub paid_at: Option<String>,
}

impl Order {
    pub fn customer_type(&self) -> CustomerType {
        CustomerType::from_order_type(&self.order_type)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
            .as_deref()
            .and_then(crate::util::parse_timestamp)
    }
}

/// Order item as returned inside `GET /orders/{id}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItemDetail {
    #[serde(default)]
    pub id: Option<u64>,
    pub product_id: u64,
    #[serde(default)]
    pub product_name: Option<String>,
    /// Unit price in rupiah
    #[serde(default, with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub note: Option<String>,
}

/// Order detail as returned by `GET /orders/{id}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderDetail {
    pub id: u64,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub order_type: String,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItemDetail>,
}

impl OrderDetail {
    pub fn customer_type(&self) -> CustomerType {
        CustomerType::from_order_type(&self.order_type)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
            .as_deref()
            .and_then(crate::util::parse_timestamp)
    }
}

/// Item entry of an order submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItemPayload {
    pub product_id: u64,
    pub quantity: u32,
    /// Unit price after the per-product discount
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub note: String,
}

impl From<&LineItem> for OrderItemPayload {
    fn from(item: &LineItem) -> Self {
        Self {
            product_id: item.product_id(),
            quantity: item.quantity(),
            price: item.product.effective_price(),
            note: item.note.clone().unwrap_or_default(),
        }
    }
}

/// Order body of `POST /orders`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderPayload {
    pub order_type: String,
    pub payment_status: PaymentStatus,
    /// Empty for held orders
    pub payment_method: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<u64>,
    pub items: Vec<OrderItemPayload>,
}

impl OrderPayload {
    /// Payload for parking an order as unpaid
    pub fn hold(
        customer_type: CustomerType,
        items: &[LineItem],
        total_amount: Decimal,
        created_by: u64,
    ) -> Self {
        Self {
            order_type: customer_type.as_order_type().to_string(),
            payment_status: PaymentStatus::Unpaid,
            payment_method: String::new(),
            total_amount,
            created_by: Some(created_by),
            items: items.iter().map(OrderItemPayload::from).collect(),
        }
    }

    /// Payload for settling an order.
    ///
    /// `status` is `Paid` for a brand-new order and `Unpaid` when the payload
    /// accompanies a `pay` action on an existing order; the action performs
    /// the transition server-side.
    pub fn settle(
        status: PaymentStatus,
        customer_type: CustomerType,
        payment_method: PaymentMethod,
        items: &[LineItem],
        total_amount: Decimal,
        created_by: Option<u64>,
    ) -> Self {
        Self {
            order_type: customer_type.as_order_type().to_string(),
            payment_status: status,
            payment_method: payment_method.as_str().to_string(),
            total_amount,
            created_by,
            items: items.iter().map(OrderItemPayload::from).collect(),
        }
    }
}

/// `{ "order": {...} }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateOrderRequest {
    pub order: OrderPayload,
}

/// Action on an existing order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderAction {
    Pay,
}

/// `{ "order_id": 12, "action": "pay", "order": {...} }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayOrderRequest {
    pub order_id: u64,
    pub action: OrderAction,
    pub order: OrderPayload,
}

impl PayOrderRequest {
    pub fn new(order_id: u64, order: OrderPayload) -> Self {
        Self {
            order_id,
            action: OrderAction::Pay,
            order,
        }
    }
}

/// Query for `GET /orders`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuery {
    pub payment_status: Option<PaymentStatus>,
    pub limit: u32,
    pub offset: u32,
}

impl OrderQuery {
    /// All unpaid orders in one page
    pub fn unpaid() -> Self {
        Self {
            payment_status: Some(PaymentStatus::Unpaid),
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }

    pub fn to_query_string(&self) -> String {
        let mut params = vec![
            format!("limit={}", self.limit),
            format!("offset={}", self.offset),
        ];
        if let Some(status) = self.payment_status {
            params.push(format!("payment_status={}", status.as_str()));
        }
        params.join("&")
    }
}

impl Default for OrderQuery {
    fn default() -> Self {
        Self {
            payment_status: None,
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}
