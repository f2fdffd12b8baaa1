//! Money calculation for the sales screen
//!
//! All arithmetic is done on `Decimal`. Amounts are rupiah; rounding to whole
//! rupiah only happens for display (`round_rupiah`, `format_idr`).

use super::types::{DiscountInfo, DiscountKind, LineItem};
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// PPN rate applied after discount (10%)
pub const TAX_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Unit price after a percentage discount. The percentage is clamped to 0-100.
pub fn discounted_unit_price(unit_price: Decimal, discount_percent: Option<Decimal>) -> Decimal {
    match discount_percent {
        Some(pct) if !pct.is_zero() => {
            let pct = pct.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
            unit_price.saturating_mul(Decimal::ONE - pct / Decimal::ONE_HUNDRED)
        }
        _ => unit_price,
    }
}

/// `unit_price × (1 − discount/100) × quantity`, saturating at `Decimal::MAX`
pub fn line_subtotal(
    unit_price: Decimal,
    discount_percent: Option<Decimal>,
    quantity: u32,
) -> Decimal {
    discounted_unit_price(unit_price, discount_percent).saturating_mul(Decimal::from(quantity))
}

/// Sum of line subtotals, recomputed from the product snapshots
pub fn subtotal(items: &[LineItem]) -> Decimal {
    items
        .iter()
        .map(|item| {
            line_subtotal(
                item.product.unit_price,
                item.product.discount_percent,
                item.quantity(),
            )
        })
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Parse a discount value as typed. Blank or non-numeric input yields `None`.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// Order-level discount amount.
///
/// Percentage discounts are taken from `subtotal`; nominal discounts are
/// returned verbatim, even when larger than `subtotal`. Malformed input, and
/// a percentage too large to apply, is treated as no discount.
pub fn discount(kind: DiscountKind, raw_value: &str, subtotal: Decimal) -> Decimal {
    let Some(value) = parse_amount(raw_value) else {
        return Decimal::ZERO;
    };
    match kind {
        DiscountKind::Percentage => value
            .checked_div(Decimal::ONE_HUNDRED)
            .and_then(|rate| subtotal.checked_mul(rate))
            .unwrap_or(Decimal::ZERO),
        DiscountKind::Nominal => value,
    }
}

/// Flat 10% tax
pub fn tax(amount_after_discount: Decimal) -> Decimal {
    amount_after_discount.saturating_mul(TAX_RATE)
}

/// `subtotal − discount + tax`
pub fn total(subtotal: Decimal, discount: Decimal, tax: Decimal) -> Decimal {
    subtotal.saturating_sub(discount).saturating_add(tax)
}

/// Round to whole rupiah (half away from zero)
pub fn round_rupiah(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Format as Indonesian rupiah, e.g. `Rp 24.255`
pub fn format_idr(amount: Decimal) -> String {
    let rounded = round_rupiah(amount);
    let digits = rounded.abs().trunc().normalize().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-Rp {}", grouped)
    } else {
        format!("Rp {}", grouped)
    }
}

/// Derived totals of an order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Totals {
    /// Sum of line subtotals
    pub subtotal: Decimal,
    /// Order discount actually applied (capped to `[0, subtotal]`)
    pub discount: Decimal,
    /// `subtotal − discount`
    pub after_discount: Decimal,
    /// 10% of `after_discount`
    pub tax: Decimal,
    /// `subtotal − discount + tax`
    pub total: Decimal,
}

impl Totals {
    /// Compute totals for a set of items and an optional order discount.
    ///
    /// A nominal discount larger than the subtotal is capped so the total
    /// never goes negative.
    pub fn compute(items: &[LineItem], discount_info: Option<&DiscountInfo>) -> Self {
        let subtotal = subtotal(items);
        let raw_discount = discount_info
            .map(|d| discount(d.kind, &d.value, subtotal))
            .unwrap_or(Decimal::ZERO);
        let applied = raw_discount.min(subtotal).max(Decimal::ZERO);
        let after_discount = subtotal - applied;
        let tax = tax(after_discount);

        Self {
            subtotal,
            discount: applied,
            after_discount,
            tax,
            total: total(subtotal, applied, tax),
        }
    }
}

// ==================== Tests ====================
