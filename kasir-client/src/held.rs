//! Held-order reconciliation
//!
//! The backend is the source of truth for held (unpaid) orders. The local
//! cache mirrors the last reconciled list and additionally keeps local-only
//! orders that never reached the backend.
//!
//! # Reconciliation
//!
//! 1. `GET /orders?payment_status=unpaid` lists the backend's held orders
//! 2. Each order's detail is fetched concurrently for its items
//! 3. Local-only cached orders are appended after the backend set
//! 4. Duplicates collapse to the first occurrence, so backend entries win
//! 5. The combined list replaces the cached one and is paginated client-side
//!
//! A failed listing falls back to the cached list, paginated the same way.

use crate::api::OrdersApi;
use crate::cache::HeldOrderCache;
use crate::draft::OrderDraft;
use crate::{ClientResult, PosError, PosResult};
use chrono::Utc;
use futures::future::join_all;
use shared::models::{Order, OrderDetail, OrderItemDetail, OrderQuery};
use shared::{HeldOrder, LineItem, OrderRef, ProductRef};
use std::collections::HashSet;
use std::sync::Arc;

/// One page of the held-order list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeldPage {
    pub orders: Vec<HeldOrder>,
    /// 1-based page number
    pub page: usize,
    pub total_pages: usize,
    /// Size of the whole combined list
    pub total_count: usize,
}

impl HeldPage {
    /// Slice `orders` into the requested page. Page 0 is read as page 1.
    pub fn paginate(orders: &[HeldOrder], page: usize, page_size: usize) -> Self {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let start = (page - 1).saturating_mul(page_size);

        Self {
            orders: orders.iter().skip(start).take(page_size).cloned().collect(),
            page,
            total_pages: orders.len().div_ceil(page_size),
            total_count: orders.len(),
        }
    }
}

/// Result of listing held orders.
///
/// `fallback_error` is set when the backend could not be reached and the
/// page was served from the cache instead.
#[derive(Debug)]
pub struct HeldListing {
    pub page: HeldPage,
    pub fallback_error: Option<PosError>,
}

impl HeldListing {
    pub fn is_fallback(&self) -> bool {
        self.fallback_error.is_some()
    }
}

/// Merges backend-held orders with the local cache
#[derive(Clone)]
pub struct HeldOrderReconciler {
    api: Arc<dyn OrdersApi>,
    cache: HeldOrderCache,
    page_size: usize,
}

impl HeldOrderReconciler {
    pub fn new(api: Arc<dyn OrdersApi>, cache: HeldOrderCache, page_size: usize) -> Self {
        Self {
            api,
            cache,
            page_size: page_size.max(1),
        }
    }

    pub fn cache(&self) -> &HeldOrderCache {
        &self.cache
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Fetch, merge and cache the full held list
    pub async fn reconcile(&self) -> PosResult<Vec<HeldOrder>> {
        let backend = self.fetch_backend_held().await?;
        let cached = self.cache.load_held().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Held-order cache unreadable, ignoring local-only orders");
            Vec::new()
        });

        let combined = merge_held(backend, cached);
        if let Err(e) = self.cache.save_held(&combined) {
            tracing::warn!(error = %e, "Could not cache reconciled held orders");
        }
        tracing::debug!(count = combined.len(), "Held orders reconciled");
        Ok(combined)
    }

    /// List one page of held orders.
    ///
    /// Never fails outright: when reconciliation fails the page comes from
    /// the cache and the error is carried in [`HeldListing::fallback_error`].
    pub async fn list_held(&self, page: usize) -> HeldListing {
        match self.reconcile().await {
            Ok(all) => HeldListing {
                page: HeldPage::paginate(&all, page, self.page_size),
                fallback_error: None,
            },
            Err(err) => {
                tracing::warn!(error = %err, page, "Held-order fetch failed, serving cached list");
                let cached = self.cache.load_held().unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Held-order cache unreadable");
                    Vec::new()
                });
                HeldListing {
                    page: HeldPage::paginate(&cached, page, self.page_size),
                    fallback_error: Some(err),
                }
            }
        }
    }

    /// Resolve a held order and load it into a fresh draft.
    ///
    /// A cached entry with items is used as-is; otherwise a backend order is
    /// fetched by id. An order without items is rejected and nothing is
    /// persisted. An unreadable cache only matters for local-only orders.
    pub async fn recall(&self, order: &OrderRef) -> PosResult<OrderDraft> {
        let cached = match self.cache.load_held() {
            Ok(held) => held.into_iter().find(|h| &h.id == order),
            Err(e) => {
                tracing::warn!(order_id = %order, error = %e, "Held-order cache unreadable during recall");
                None
            }
        };

        let held = match (cached, order) {
            (Some(held), _) if held.has_items() => held,
            (_, OrderRef::Synced(id)) => {
                let detail = self.api.get_order(*id).await?;
                held_from_detail(detail)
            }
            (Some(held), OrderRef::Local(_)) => held,
            (None, OrderRef::Local(_)) => return Err(PosError::HeldOrderNotFound(order.clone())),
        };

        if !held.has_items() {
            return Err(PosError::EmptyRecall(order.clone()));
        }

        let draft = OrderDraft::recalled(
            order.clone(),
            held.items,
            held.customer_type,
            held.discount_info,
        );
        if let Some(snapshot) = draft.snapshot()
            && let Err(e) = self.cache.save_recalled(&snapshot)
        {
            tracing::warn!(order_id = %order, error = %e, "Could not persist recalled order");
        }
        tracing::info!(order_id = %order, items = draft.items().len(), "Held order recalled");
        Ok(draft)
    }

    /// Cancel a held order, then re-list `page`.
    ///
    /// Backend orders are canceled server-side first; the cache is only
    /// touched by the re-list. Local-only orders are dropped from the cache.
    pub async fn delete(&self, order: &OrderRef, page: usize) -> PosResult<HeldListing> {
        match order {
            OrderRef::Synced(id) => {
                self.api.cancel_order(*id).await?;
                tracing::info!(order_id = id, "Held order canceled");
            }
            OrderRef::Local(_) => {
                self.discard_local(order)?;
                tracing::info!(order_id = %order, "Local held order discarded");
            }
        }
        Ok(self.list_held(page).await)
    }

    /// Remove a local-only order from the cache
    pub fn discard_local(&self, order: &OrderRef) -> PosResult<()> {
        let mut cached = self.cache.load_held()?;
        let before = cached.len();
        cached.retain(|h| &h.id != order);
        if cached.len() == before {
            return Err(PosError::HeldOrderNotFound(order.clone()));
        }
        self.cache.save_held(&cached)?;
        Ok(())
    }

    async fn fetch_backend_held(&self) -> ClientResult<Vec<HeldOrder>> {
        let orders = self.api.list_orders(&OrderQuery::unpaid()).await?;
        let details = join_all(orders.iter().map(|o| self.api.get_order(o.id))).await;

        Ok(orders
            .into_iter()
            .zip(details)
            .map(|(order, detail)| match detail {
                Ok(detail) => held_from_detail(detail),
                Err(e) => {
                    tracing::warn!(order_id = order.id, error = %e, "Order detail fetch failed, listing without items");
                    held_from_summary(order)
                }
            })
            .collect())
    }
}

/// Combine backend and cached orders.
///
/// Only local-only cached orders survive; cached copies of backend orders
/// are superseded by the fresh backend list. The first occurrence of an id
/// wins.
pub fn merge_held(backend: Vec<HeldOrder>, cached: Vec<HeldOrder>) -> Vec<HeldOrder> {
    let local_only = cached.into_iter().filter(|h| h.id.is_local());
    let mut seen = HashSet::new();
    backend
        .into_iter()
        .chain(local_only)
        .filter(|h| seen.insert(h.id.clone()))
        .collect()
}

fn held_from_summary(order: Order) -> HeldOrder {
    HeldOrder {
        id: OrderRef::Synced(order.id),
        items: Vec::new(),
        customer_type: order.customer_type(),
        total: order.total_amount,
        created_at: order.created_at().unwrap_or_else(Utc::now),
        discount_info: None,
    }
}

fn held_from_detail(detail: OrderDetail) -> HeldOrder {
    let customer_type = detail.customer_type();
    let created_at = detail.created_at().unwrap_or_else(Utc::now);
    let id = detail.id;
    let items = detail
        .items
        .into_iter()
        .filter_map(|item| line_item_from_detail(id, item))
        .collect();

    HeldOrder {
        id: OrderRef::Synced(id),
        items,
        customer_type,
        total: detail.total_amount,
        created_at,
        discount_info: None,
    }
}

/// Backend items carry the already-discounted unit price, so the product
/// snapshot has no discount of its own.
fn line_item_from_detail(order_id: u64, item: OrderItemDetail) -> Option<LineItem> {
    if item.quantity == 0 {
        tracing::warn!(order_id, product_id = item.product_id, "Dropping order item with zero quantity");
        return None;
    }

    let product = ProductRef {
        id: item.product_id,
        name: item
            .product_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "Product".to_string()),
        unit_price: item.price,
        discount_percent: None,
    };
    let mut line = LineItem::new(product, item.quantity);
    if let Some(note) = item.note {
        line.set_note(note);
    }
    Some(line)
}
