//! Order lifecycle on the sales screen
//!
//! ```text
//! Drafting --hold--> (held on backend) --recall--> Recalled --checkout--> Paid
//!                          |                          |
//!                          +--delete--> Canceled      +--cancel_recall--> Drafting
//! ```
//!
//! Checkout runs through the steps `Order → Payment → Receipt`. The draft is
//! locked in Payment and Receipt and unlocked whenever the flow returns to
//! Order. Every backend mutation is followed by a fresh held-order listing.

use crate::api::OrdersApi;
use crate::auth::{Identity, TokenIdentity};
use crate::cache::{HeldOrderCache, KeyValueStore, MemoryStore, RedbStore};
use crate::draft::OrderDraft;
use crate::held::{HeldListing, HeldOrderReconciler, HeldPage};
use crate::{ClientConfig, PosError, PosResult};
use chrono::{DateTime, Utc};
use serde_json::Value;
use shared::models::{
    CreateOrderRequest, OrderPayload, PayOrderRequest, PaymentStatus, Product,
};
use shared::{
    CustomerType, Decimal, DiscountInfo, LineItem, OrderRef, PaymentMethod, Totals,
};
use std::sync::Arc;

/// Checkout step shown to the cashier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutStep {
    #[default]
    Order,
    Payment,
    Receipt,
}

impl CheckoutStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Order => "order",
            Self::Payment => "payment",
            Self::Receipt => "receipt",
        }
    }
}

/// Where the current draft is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderPhase {
    Drafting,
    /// Draft is bound to a held order; checkout pays that order
    Recalled,
    /// Checkout succeeded; the receipt is showing
    Paid,
}

/// Outcome of a successful checkout
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    /// Backend order that was paid, when known
    pub order: Option<OrderRef>,
    pub items: Vec<LineItem>,
    pub totals: Totals,
    pub customer_type: CustomerType,
    pub payment_method: PaymentMethod,
    pub cash_tendered: Option<Decimal>,
    /// `cash_tendered − total`, floored at zero (cash only)
    pub change: Option<Decimal>,
    pub paid_at: DateTime<Utc>,
}

impl Receipt {
    fn new(draft: &OrderDraft, order: Option<OrderRef>, cash_tendered: Option<Decimal>) -> Self {
        let totals = draft.totals();
        let payment_method = draft.payment_method();
        let cash_tendered = cash_tendered.filter(|_| payment_method == PaymentMethod::Cash);
        let change = cash_tendered.map(|cash| (cash - totals.total).max(Decimal::ZERO));

        Self {
            order,
            items: draft.items().to_vec(),
            totals,
            customer_type: draft.customer_type(),
            payment_method,
            cash_tendered,
            change,
            paid_at: Utc::now(),
        }
    }
}

/// Drives the draft through hold, recall, checkout and cancel
pub struct OrderController {
    draft: OrderDraft,
    step: CheckoutStep,
    reconciler: HeldOrderReconciler,
    api: Arc<dyn OrdersApi>,
    identity: Arc<dyn Identity>,
    page: usize,
    held: HeldPage,
    receipt: Option<Receipt>,
}

impl OrderController {
    pub fn new(
        api: Arc<dyn OrdersApi>,
        identity: Arc<dyn Identity>,
        cache: HeldOrderCache,
        page_size: usize,
    ) -> Self {
        Self {
            draft: OrderDraft::new(),
            step: CheckoutStep::Order,
            reconciler: HeldOrderReconciler::new(api.clone(), cache, page_size),
            api,
            identity,
            page: 1,
            held: HeldPage::default(),
            receipt: None,
        }
    }

    /// Wire the HTTP client, token identity and cache described by `config`
    pub fn from_config(config: &ClientConfig) -> PosResult<Self> {
        let http = config.build_http_client()?;
        let store: Arc<dyn KeyValueStore> = match &config.cache_path {
            Some(path) => Arc::new(RedbStore::open(path)?),
            None => Arc::new(MemoryStore::new()),
        };
        tracing::info!(
            base_url = %http.base_url(),
            persistent_cache = config.cache_path.is_some(),
            "Order controller ready"
        );

        Ok(Self::new(
            Arc::new(http),
            Arc::new(TokenIdentity::new(config.token.clone())),
            HeldOrderCache::new(store),
            config.held_page_size,
        ))
    }

    pub fn draft(&self) -> &OrderDraft {
        &self.draft
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    pub fn phase(&self) -> OrderPhase {
        if self.step == CheckoutStep::Receipt {
            OrderPhase::Paid
        } else if self.draft.recalled_order().is_some() {
            OrderPhase::Recalled
        } else {
            OrderPhase::Drafting
        }
    }

    /// Latest held-order page
    pub fn held_page(&self) -> &HeldPage {
        &self.held
    }

    pub fn receipt(&self) -> Option<&Receipt> {
        self.receipt.as_ref()
    }

    /// Hold is offered only for fresh drafts in the order step
    pub fn can_hold(&self) -> bool {
        self.step == CheckoutStep::Order
            && self.draft.recalled_order().is_none()
            && !self.draft.is_empty()
    }

    // ========== Draft editing ==========

    pub fn add_product(&mut self, product: &Product) -> PosResult<u32> {
        self.draft.add_or_increment(product)
    }

    pub fn decrement(&mut self, product_id: u64) -> PosResult<Option<u32>> {
        self.draft.decrement(product_id)
    }

    pub fn set_note(&mut self, product_id: u64, text: impl Into<String>) -> PosResult<bool> {
        self.draft.set_note(product_id, text)
    }

    pub fn set_customer_type(&mut self, customer_type: CustomerType) {
        self.draft.set_customer_type(customer_type);
    }

    pub fn set_discount(&mut self, discount_info: Option<DiscountInfo>) {
        self.draft.set_discount(discount_info);
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.draft.set_payment_method(method);
    }

    // ========== Held orders ==========

    /// Re-list the current held-order page
    pub async fn refresh_held(&mut self) -> HeldListing {
        let listing = self.reconciler.list_held(self.page).await;
        self.held = listing.page.clone();
        listing
    }

    pub async fn set_page(&mut self, page: usize) -> HeldListing {
        self.page = page.max(1);
        self.refresh_held().await
    }

    /// Park the draft on the backend as an unpaid order.
    ///
    /// The held total carries no order discount, so a recalled order totals
    /// to the same figure; the discount is chosen again at payment.
    /// Validation happens before any backend call. On failure the draft is
    /// left exactly as it was.
    pub async fn hold(&mut self) -> PosResult<HeldListing> {
        self.ensure_step(CheckoutStep::Order)?;
        if self.draft.recalled_order().is_some() {
            return Err(PosError::RecallInProgress);
        }
        if self.draft.is_empty() {
            return Err(PosError::EmptyOrder);
        }
        let user_id = self
            .identity
            .current_user_id()
            .ok_or(PosError::MissingUser)?;

        let totals = Totals::compute(self.draft.items(), None);
        let order = OrderPayload::hold(
            self.draft.customer_type(),
            self.draft.items(),
            totals.total,
            user_id,
        );
        let response = self.api.create_order(&CreateOrderRequest { order }).await?;
        tracing::info!(
            order_id = ?created_id(&response),
            total = %totals.total,
            items = self.draft.items().len(),
            "Order held"
        );

        self.draft.reset();
        Ok(self.refresh_held().await)
    }

    /// Load a held order into the draft, replacing the current one
    pub async fn recall(&mut self, order: &OrderRef) -> PosResult<()> {
        self.ensure_step(CheckoutStep::Order)?;
        self.draft = self.reconciler.recall(order).await?;
        Ok(())
    }

    /// Drop the recalled order from the draft without touching the backend
    pub fn cancel_recall(&mut self) -> PosResult<()> {
        self.ensure_step(CheckoutStep::Order)?;
        self.reconciler.cache().clear_recalled()?;
        if let Some(order) = self.draft.recalled_order() {
            tracing::info!(order_id = %order, "Recall canceled");
        }
        self.draft.reset();
        Ok(())
    }

    /// Cancel a held order and re-list.
    ///
    /// Canceling the order currently recalled also ends the recall; its
    /// items stay in the draft as a fresh order.
    pub async fn delete_held(&mut self, order: &OrderRef) -> PosResult<HeldListing> {
        let listing = self.reconciler.delete(order, self.page).await?;
        self.held = listing.page.clone();

        if self.draft.recalled_order() == Some(order) {
            self.draft.clear_recall();
            self.reconciler.cache().clear_recalled()?;
        }
        Ok(listing)
    }

    /// Rebuild the draft from a recall interrupted by a restart.
    ///
    /// Returns `true` when a recalled order was restored.
    pub fn restore(&mut self) -> PosResult<bool> {
        match self.reconciler.cache().load_recalled()? {
            Some(snapshot) => {
                tracing::info!(order_id = %snapshot.order, "Recalled order restored");
                self.draft = OrderDraft::from_snapshot(snapshot);
                self.step = CheckoutStep::Order;
                self.receipt = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // ========== Checkout ==========

    /// Enter the payment step; the draft is locked from here on
    pub fn begin_payment(&mut self) -> PosResult<()> {
        self.ensure_step(CheckoutStep::Order)?;
        if self.draft.is_empty() {
            return Err(PosError::EmptyOrder);
        }
        self.draft.lock();
        self.step = CheckoutStep::Payment;
        Ok(())
    }

    /// Leave the payment step and unlock the draft
    pub fn back_to_order(&mut self) -> PosResult<()> {
        self.ensure_step(CheckoutStep::Payment)?;
        self.draft.unlock();
        self.step = CheckoutStep::Order;
        Ok(())
    }

    /// Settle the draft.
    ///
    /// A recalled backend order is paid through the `pay` action; anything
    /// else is created as a new paid order. On success the draft stays
    /// locked behind the receipt. On failure it is unlocked and the flow
    /// returns to the order step with nothing changed.
    pub async fn checkout(
        &mut self,
        method: PaymentMethod,
        cash_tendered: Option<Decimal>,
    ) -> PosResult<Receipt> {
        if self.step == CheckoutStep::Receipt {
            return Err(PosError::InvalidStep(self.step.as_str()));
        }
        if self.draft.is_empty() {
            return Err(PosError::EmptyOrder);
        }

        self.draft.lock();
        self.step = CheckoutStep::Payment;

        let paid = match self.submit_payment(method).await {
            Ok(paid) => paid,
            Err(err) => {
                tracing::warn!(error = %err, "Checkout failed");
                self.draft.unlock();
                self.step = CheckoutStep::Order;
                return Err(err);
            }
        };

        self.draft.set_payment_method(method);
        let recalled = self.draft.recalled_order().cloned();
        if let Some(order) = &recalled
            && order.is_local()
            && let Err(e) = self.reconciler.discard_local(order)
        {
            tracing::warn!(order_id = %order, error = %e, "Could not drop paid local order from cache");
        }
        if let Err(e) = self.reconciler.cache().clear_recalled() {
            tracing::warn!(error = %e, "Could not clear recalled-order pointer");
        }

        let receipt = Receipt::new(&self.draft, paid, cash_tendered);
        tracing::info!(
            order_id = ?receipt.order.as_ref().map(ToString::to_string),
            total = %receipt.totals.total,
            method = method.as_str(),
            "Order paid"
        );

        self.draft.clear_recall();
        self.step = CheckoutStep::Receipt;
        self.receipt = Some(receipt.clone());
        self.refresh_held().await;
        Ok(receipt)
    }

    /// Start over after a receipt (or abandon the current draft)
    pub fn new_order(&mut self) -> PosResult<()> {
        self.reconciler.cache().clear_recalled()?;
        self.draft.reset();
        self.receipt = None;
        self.step = CheckoutStep::Order;
        Ok(())
    }

    async fn submit_payment(&self, method: PaymentMethod) -> PosResult<Option<OrderRef>> {
        let totals = self.draft.totals();
        let created_by = self.identity.current_user_id();

        match self.draft.recalled_order() {
            Some(OrderRef::Synced(id)) => {
                let order = OrderPayload::settle(
                    PaymentStatus::Unpaid,
                    self.draft.customer_type(),
                    method,
                    self.draft.items(),
                    totals.total,
                    created_by,
                );
                self.api
                    .pay_order(&PayOrderRequest::new(*id, order))
                    .await?;
                Ok(Some(OrderRef::Synced(*id)))
            }
            _ => {
                let order = OrderPayload::settle(
                    PaymentStatus::Paid,
                    self.draft.customer_type(),
                    method,
                    self.draft.items(),
                    totals.total,
                    created_by,
                );
                let response = self.api.create_order(&CreateOrderRequest { order }).await?;
                Ok(created_id(&response).map(OrderRef::Synced))
            }
        }
    }

    fn ensure_step(&self, expected: CheckoutStep) -> PosResult<()> {
        if self.step == expected {
            Ok(())
        } else {
            Err(PosError::InvalidStep(self.step.as_str()))
        }
    }
}

/// Id of a created order, from either `{ "id": .. }` or `{ "data": { "id": .. } }`
fn created_id(response: &Value) -> Option<u64> {
    response
        .get("id")
        .or_else(|| response.get("data").and_then(|d| d.get("id")))
        .and_then(Value::as_u64)
}
