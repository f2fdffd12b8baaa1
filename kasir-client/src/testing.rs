//! Test doubles shared by the module tests

use crate::api::OrdersApi;
use crate::cache::{CacheError, CacheResult, KeyValueStore};
use crate::{ClientError, ClientResult};
use async_trait::async_trait;
use serde_json::{Value, json};
use shared::Decimal;
use shared::models::{
    CreateOrderRequest, Order, OrderDetail, OrderItemDetail, OrderPayload, OrderQuery,
    PayOrderRequest, PaymentStatus, Product, ProductStatus,
};
use std::collections::HashSet;
use std::sync::Mutex;

pub fn product(id: u64, price: i64, discount: Option<i64>) -> Product {
    Product {
        id,
        name: format!("Product {}", id),
        price: Decimal::from(price),
        category: "Food".into(),
        unit: "pcs".into(),
        is_package: false,
        image: None,
        discount: discount.map(Decimal::from),
        status: ProductStatus::Active,
    }
}

/// Store whose every read and write fails
pub struct BrokenStore;

impl BrokenStore {
    fn error() -> CacheError {
        CacheError::Serialization(serde_json::from_str::<Value>("{").unwrap_err())
    }
}

impl KeyValueStore for BrokenStore {
    fn get(&self, _key: &str) -> CacheResult<Option<Vec<u8>>> {
        Err(Self::error())
    }

    fn set(&self, _key: &str, _value: &[u8]) -> CacheResult<()> {
        Err(Self::error())
    }

    fn remove(&self, _key: &str) -> CacheResult<()> {
        Err(Self::error())
    }
}

/// Backend call as seen by [`MockBackend`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List,
    Get(u64),
    Create(OrderPayload),
    Pay(u64, OrderPayload),
    Cancel(u64),
}

#[derive(Default)]
struct State {
    orders: Vec<OrderDetail>,
    next_id: u64,
    calls: Vec<Call>,
    fail_list: bool,
    fail_create: bool,
    fail_pay: bool,
    fail_cancel: bool,
    fail_detail: HashSet<u64>,
}

/// In-memory orders backend with failure switches
pub struct MockBackend {
    state: Mutex<State>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 1,
                ..State::default()
            }),
        }
    }

    /// Seed an order the way the backend would have stored it
    pub fn seed(&self, order_type: &str, status: PaymentStatus, items: &[(u64, i64, u32)]) -> u64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        let items: Vec<OrderItemDetail> = items
            .iter()
            .map(|(product_id, price, quantity)| OrderItemDetail {
                id: None,
                product_id: *product_id,
                product_name: Some(format!("Product {}", product_id)),
                price: Decimal::from(*price),
                quantity: *quantity,
                note: None,
            })
            .collect();
        let total: Decimal = items
            .iter()
            .map(|i| i.price * Decimal::from(i.quantity))
            .sum();
        state.orders.push(OrderDetail {
            id,
            order_number: Some(format!("ORD-{:04}", id)),
            order_type: order_type.to_string(),
            total_amount: total,
            payment_status: status,
            payment_method: None,
            created_at: Some("2026-01-15T10:30:00".to_string()),
            items,
        });
        id
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn mutating_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Create(_) | Call::Pay(..) | Call::Cancel(_)))
            .count()
    }

    pub fn order(&self, id: u64) -> Option<OrderDetail> {
        self.state
            .lock()
            .unwrap()
            .orders
            .iter()
            .find(|o| o.id == id)
            .cloned()
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.state.lock().unwrap().fail_list = fail;
    }

    pub fn set_fail_create(&self, fail: bool) {
        self.state.lock().unwrap().fail_create = fail;
    }

    pub fn set_fail_pay(&self, fail: bool) {
        self.state.lock().unwrap().fail_pay = fail;
    }

    pub fn set_fail_cancel(&self, fail: bool) {
        self.state.lock().unwrap().fail_cancel = fail;
    }

    pub fn fail_detail(&self, id: u64) {
        self.state.lock().unwrap().fail_detail.insert(id);
    }
}

fn summary(detail: &OrderDetail) -> Order {
    Order {
        id: detail.id,
        order_number: detail.order_number.clone(),
        order_type: detail.order_type.clone(),
        total_amount: detail.total_amount,
        payment_status: detail.payment_status,
        payment_method: detail.payment_method.clone(),
        created_at: detail.created_at.clone(),
        paid_at: None,
    }
}

fn server_error() -> ClientError {
    ClientError::Internal("API error: 500".to_string())
}

#[async_trait]
impl OrdersApi for MockBackend {
    async fn list_orders(&self, query: &OrderQuery) -> ClientResult<Vec<Order>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::List);
        if state.fail_list {
            return Err(server_error());
        }
        Ok(state
            .orders
            .iter()
            .filter(|o| query.payment_status.is_none_or(|s| o.payment_status == s))
            .map(summary)
            .collect())
    }

    async fn get_order(&self, id: u64) -> ClientResult<OrderDetail> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Get(id));
        if state.fail_detail.contains(&id) {
            return Err(server_error());
        }
        state
            .orders
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound("Order not found".to_string()))
    }

    async fn create_order(&self, request: &CreateOrderRequest) -> ClientResult<Value> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Create(request.order.clone()));
        if state.fail_create {
            return Err(server_error());
        }
        let id = state.next_id;
        state.next_id += 1;
        let order = &request.order;
        state.orders.push(OrderDetail {
            id,
            order_number: Some(format!("ORD-{:04}", id)),
            order_type: order.order_type.clone(),
            total_amount: order.total_amount,
            payment_status: order.payment_status,
            payment_method: Some(order.payment_method.clone()),
            created_at: Some("2026-01-15T11:00:00".to_string()),
            items: order
                .items
                .iter()
                .map(|i| OrderItemDetail {
                    id: None,
                    product_id: i.product_id,
                    product_name: Some(format!("Product {}", i.product_id)),
                    price: i.price,
                    quantity: i.quantity,
                    note: Some(i.note.clone()).filter(|n| !n.is_empty()),
                })
                .collect(),
        });
        Ok(json!({ "id": id }))
    }

    async fn pay_order(&self, request: &PayOrderRequest) -> ClientResult<Value> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(Call::Pay(request.order_id, request.order.clone()));
        if state.fail_pay {
            return Err(server_error());
        }
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == request.order_id)
            .ok_or_else(|| ClientError::NotFound("Order not found".to_string()))?;
        if order.payment_status != PaymentStatus::Unpaid {
            return Err(ClientError::Validation("Order is not unpaid".to_string()));
        }
        order.payment_status = PaymentStatus::Paid;
        order.payment_method = Some(request.order.payment_method.clone());
        order.total_amount = request.order.total_amount;
        Ok(json!({ "id": request.order_id }))
    }

    async fn cancel_order(&self, id: u64) -> ClientResult<Value> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Cancel(id));
        if state.fail_cancel {
            return Err(server_error());
        }
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| ClientError::NotFound("Order not found".to_string()))?;
        if order.payment_status != PaymentStatus::Unpaid {
            return Err(ClientError::Validation("Order is not unpaid".to_string()));
        }
        order.payment_status = PaymentStatus::Canceled;
        Ok(json!({ "id": id }))
    }
}
