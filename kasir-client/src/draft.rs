//! Order draft: the order currently being built on the sales screen

use crate::{PosError, PosResult};
use shared::models::Product;
use shared::{
    CustomerType, DiscountInfo, LineItem, OrderRef, PaymentMethod, ProductRef, RecalledSnapshot,
    Totals,
};

/// In-memory order under construction.
///
/// Items keep insertion order. While `locked` (payment and receipt steps)
/// every item mutation is rejected with [`PosError::OrderLocked`]. Discount,
/// payment method and customer type stay editable since the payment step
/// is where they are chosen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderDraft {
    items: Vec<LineItem>,
    customer_type: CustomerType,
    discount_info: Option<DiscountInfo>,
    payment_method: PaymentMethod,
    recalled_order: Option<OrderRef>,
    locked: bool,
}

impl OrderDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draft populated from a recalled held order
    pub fn recalled(
        order: OrderRef,
        items: Vec<LineItem>,
        customer_type: CustomerType,
        discount_info: Option<DiscountInfo>,
    ) -> Self {
        Self {
            items,
            customer_type,
            discount_info,
            recalled_order: Some(order),
            ..Self::default()
        }
    }

    /// Rebuild a draft from the persisted recalled pointer
    pub fn from_snapshot(snapshot: RecalledSnapshot) -> Self {
        Self::recalled(
            snapshot.order,
            snapshot.items,
            snapshot.customer_type,
            snapshot.discount_info,
        )
    }

    /// Snapshot for persisting the recall association, if any
    pub fn snapshot(&self) -> Option<RecalledSnapshot> {
        self.recalled_order.clone().map(|order| RecalledSnapshot {
            order,
            items: self.items.clone(),
            customer_type: self.customer_type,
            discount_info: self.discount_info.clone(),
        })
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn customer_type(&self) -> CustomerType {
        self.customer_type
    }

    pub fn discount_info(&self) -> Option<&DiscountInfo> {
        self.discount_info.as_ref()
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn recalled_order(&self) -> Option<&OrderRef> {
        self.recalled_order.as_ref()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn quantity_of(&self, product_id: u64) -> Option<u32> {
        self.find(product_id).map(LineItem::quantity)
    }

    /// Add one unit of `product`. Returns the new quantity.
    pub fn add_or_increment(&mut self, product: &Product) -> PosResult<u32> {
        self.ensure_unlocked()?;
        if !product.is_active() {
            return Err(PosError::ProductInactive(product.id));
        }

        if let Some(item) = self.find_mut(product.id) {
            let quantity = item.quantity() + 1;
            item.set_quantity(quantity);
            return Ok(quantity);
        }

        self.items.push(LineItem::new(ProductRef::from(product), 1));
        Ok(1)
    }

    /// Remove one unit of the product.
    ///
    /// Returns the remaining quantity, or `None` once the item is gone
    /// (removed at zero, or never present).
    pub fn decrement(&mut self, product_id: u64) -> PosResult<Option<u32>> {
        self.ensure_unlocked()?;
        let Some(pos) = self.items.iter().position(|i| i.product_id() == product_id) else {
            return Ok(None);
        };

        let quantity = self.items[pos].quantity().saturating_sub(1);
        if self.items[pos].set_quantity(quantity) {
            Ok(Some(quantity))
        } else {
            self.items.remove(pos);
            Ok(None)
        }
    }

    /// Attach a note to an item. Returns `false` when the product is not in the order.
    pub fn set_note(&mut self, product_id: u64, text: impl Into<String>) -> PosResult<bool> {
        self.ensure_unlocked()?;
        match self.find_mut(product_id) {
            Some(item) => {
                item.set_note(text);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn set_customer_type(&mut self, customer_type: CustomerType) {
        self.customer_type = customer_type;
    }

    pub fn set_discount(&mut self, discount_info: Option<DiscountInfo>) {
        self.discount_info = discount_info;
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = method;
    }

    pub fn totals(&self) -> Totals {
        Totals::compute(&self.items, self.discount_info.as_ref())
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Forget the recalled-order association, keeping the items
    pub fn clear_recall(&mut self) {
        self.recalled_order = None;
    }

    /// Back to an empty, unlocked draft
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn ensure_unlocked(&self) -> PosResult<()> {
        if self.locked {
            Err(PosError::OrderLocked)
        } else {
            Ok(())
        }
    }

    fn find(&self, product_id: u64) -> Option<&LineItem> {
        self.items.iter().find(|i| i.product_id() == product_id)
    }

    fn find_mut(&mut self, product_id: u64) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|i| i.product_id() == product_id)
    }
}
