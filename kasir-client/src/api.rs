//! Backend API surface used by the sales screen
//!
//! | Call | Endpoint |
//! |------|----------|
//! | `list_orders` | `GET /orders?limit=&offset=&payment_status=` |
//! | `get_order` | `GET /orders/{id}` |
//! | `create_order` / `pay_order` | `POST /orders` |
//! | `cancel_order` | `PATCH /orders/{id}/cancel` |
//! | `list_products` | `GET /products?category=` |

use crate::{ClientResult, HttpClient};
use async_trait::async_trait;
use serde_json::Value;
use shared::ListEnvelope;
use shared::models::{
    CreateOrderRequest, Order, OrderDetail, OrderQuery, PayOrderRequest, Product, ProductCreate,
    ProductUpdate,
};

/// Orders collaborator
#[async_trait]
pub trait OrdersApi: Send + Sync {
    async fn list_orders(&self, query: &OrderQuery) -> ClientResult<Vec<Order>>;

    async fn get_order(&self, id: u64) -> ClientResult<OrderDetail>;

    /// Create an order (held or paid, per the payload's status)
    async fn create_order(&self, request: &CreateOrderRequest) -> ClientResult<Value>;

    /// Settle an existing unpaid order
    async fn pay_order(&self, request: &PayOrderRequest) -> ClientResult<Value>;

    /// Transition an unpaid order to canceled
    async fn cancel_order(&self, id: u64) -> ClientResult<Value>;
}

/// Product catalog collaborator
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list_products(&self, category: Option<&str>) -> ClientResult<Vec<Product>>;

    async fn get_product(&self, id: u64) -> ClientResult<Product>;

    async fn create_product(&self, product: &ProductCreate) -> ClientResult<Product>;

    async fn update_product(&self, id: u64, changes: &ProductUpdate) -> ClientResult<Product>;

    async fn delete_product(&self, id: u64) -> ClientResult<()>;
}

#[async_trait]
impl OrdersApi for HttpClient {
    async fn list_orders(&self, query: &OrderQuery) -> ClientResult<Vec<Order>> {
        let path = format!("orders?{}", query.to_query_string());
        let envelope: ListEnvelope<Order> = self.get(&path).await?;
        Ok(envelope.data)
    }

    async fn get_order(&self, id: u64) -> ClientResult<OrderDetail> {
        self.get(&format!("orders/{}", id)).await
    }

    async fn create_order(&self, request: &CreateOrderRequest) -> ClientResult<Value> {
        self.post("orders", request).await
    }

    async fn pay_order(&self, request: &PayOrderRequest) -> ClientResult<Value> {
        self.post("orders", request).await
    }

    async fn cancel_order(&self, id: u64) -> ClientResult<Value> {
        self.patch_empty(&format!("orders/{}/cancel", id)).await
    }
}

#[async_trait]
impl CatalogApi for HttpClient {
    async fn list_products(&self, category: Option<&str>) -> ClientResult<Vec<Product>> {
        let path = match category.map(str::trim).filter(|c| !c.is_empty()) {
            Some(category) => format!("products?category={}", urlencoding::encode(category)),
            None => "products".to_string(),
        };
        self.get(&path).await
    }

    async fn get_product(&self, id: u64) -> ClientResult<Product> {
        self.get(&format!("products/{}", id)).await
    }

    async fn create_product(&self, product: &ProductCreate) -> ClientResult<Product> {
        self.post("products", product).await
    }

    async fn update_product(&self, id: u64, changes: &ProductUpdate) -> ClientResult<Product> {
        self.put(&format!("products/{}", id), changes).await
    }

    async fn delete_product(&self, id: u64) -> ClientResult<()> {
        let _: Value = self.delete(&format!("products/{}", id)).await?;
        Ok(())
    }
}
