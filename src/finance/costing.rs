//! Production cost roll-ups and the per-sale cost resolution.
//!
//! DESIGN
//! ======
//! A sale's production cost is resolved in three tiers, first match wins:
//!
//! 1. `Precomputed`: a positive `total_production_cost` stored on the sale.
//! 2. `Batch`: the linked production batch's unit cost, converted into the
//!    sale currency, times the quantity sold.
//! 3. `Estimated`: 70% of revenue when no usable batch is linked.
//!
//! Every screen that shows cost or profit goes through [`resolve_sale_cost`]
//! so the same sale always reports the same numbers, along with the tier
//! that produced them.

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use uuid::Uuid;

use super::rates::ExchangeRates;
use crate::model::{InventoryItem, ProductionBatch, RecipeIngredient, Sale};

/// Share of revenue assumed as cost when nothing better is known.
pub const ESTIMATED_COST_RATIO: Decimal = Decimal::from_parts(7, 0, 0, false, 1);

#[derive(Debug, thiserror::Error)]
pub enum CostingError {
    #[error("no exchange rate for currency {0}")]
    UnknownCurrency(String),
    #[error("batch {lot} has non-positive quantity")]
    NonPositiveQuantity { lot: String },
    #[error("inventory item {0} referenced by recipe not found")]
    MissingIngredient(Uuid),
    #[error("arithmetic overflow in cost calculation")]
    Overflow,
}

impl crate::error::ErrorCode for CostingError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownCurrency(_) => "E_UNKNOWN_CURRENCY",
            Self::NonPositiveQuantity { .. } => "E_NON_POSITIVE_QUANTITY",
            Self::MissingIngredient(_) => "E_MISSING_INGREDIENT",
            Self::Overflow => "E_OVERFLOW",
        }
    }
}

/// Round half away from zero to cents.
#[must_use]
pub fn money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// =============================================================================
// BATCH COSTS
// =============================================================================

/// Cost of one produced unit, in the batch currency.
///
/// # Errors
///
/// Returns `NonPositiveQuantity` when the batch quantity is zero or negative.
pub fn unit_cost(batch: &ProductionBatch) -> Result<Decimal, CostingError> {
    if batch.quantity <= Decimal::ZERO {
        return Err(CostingError::NonPositiveQuantity { lot: batch.lot_number.clone() });
    }
    batch
        .costs()
        .total()
        .checked_div(batch.quantity)
        .ok_or(CostingError::Overflow)
}

/// Unit cost converted into `currency`.
///
/// # Errors
///
/// Returns `NonPositiveQuantity` or `UnknownCurrency`.
pub fn unit_cost_in(batch: &ProductionBatch, currency: &str, rates: &ExchangeRates) -> Result<Decimal, CostingError> {
    let unit = unit_cost(batch)?;
    rates.convert(unit, &batch.currency, currency)
}

/// Raw-material cost of producing `quantity` units of a recipe, in
/// `currency`: each ingredient contributes `quantity * pct / 100 * unit_cost`.
///
/// # Errors
///
/// Returns `MissingIngredient` for an unknown inventory item, or
/// `UnknownCurrency` when an item's currency has no rate.
pub fn raw_material_rollup(
    quantity: Decimal,
    currency: &str,
    ingredients: &[RecipeIngredient],
    items: &HashMap<Uuid, InventoryItem>,
    rates: &ExchangeRates,
) -> Result<Decimal, CostingError> {
    let mut total = Decimal::ZERO;
    for line in ingredients {
        let item = items
            .get(&line.inventory_item_id)
            .ok_or(CostingError::MissingIngredient(line.inventory_item_id))?;
        let used = quantity
            .checked_mul(line.percentage)
            .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
            .ok_or(CostingError::Overflow)?;
        let cost = used.checked_mul(item.unit_cost).ok_or(CostingError::Overflow)?;
        total += rates.convert(cost, &item.currency, currency)?;
    }
    Ok(total)
}

// =============================================================================
// SALE COSTS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CostSource {
    Precomputed,
    Batch,
    Estimated,
}

impl CostSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Precomputed => "precomputed",
            Self::Batch => "batch",
            Self::Estimated => "estimated",
        }
    }
}

/// Resolved cost and profit for one sale, in the sale currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleCost {
    pub source: CostSource,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
    /// Unit cost in the sale currency when the batch tier was used.
    pub unit_cost: Option<Decimal>,
}

impl SaleCost {
    #[must_use]
    pub fn margin_pct(&self) -> Decimal {
        margin_pct(self.profit, self.revenue)
    }
}

/// `profit / revenue * 100`, or zero without revenue.
#[must_use]
pub fn margin_pct(profit: Decimal, revenue: Decimal) -> Decimal {
    if revenue.is_zero() {
        return Decimal::ZERO;
    }
    profit
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|v| v.checked_div(revenue))
        .unwrap_or(Decimal::ZERO)
}

/// Revenue of a sale; falls back to `quantity * unit_price` when no total was stored.
#[must_use]
pub fn sale_revenue(sale: &Sale) -> Decimal {
    if sale.total_amount.is_zero() {
        sale.quantity * sale.unit_price
    } else {
        sale.total_amount
    }
}

/// Resolve a sale's production cost through the three tiers.
///
/// A linked batch that is missing from `batches` or has a non-positive
/// quantity falls through to the estimate.
///
/// # Errors
///
/// Returns `UnknownCurrency` when the batch tier applies but a rate is missing.
pub fn resolve_sale_cost(
    sale: &Sale,
    batches: &HashMap<Uuid, ProductionBatch>,
    rates: &ExchangeRates,
) -> Result<SaleCost, CostingError> {
    let revenue = sale_revenue(sale);

    if let Some(stored) = sale.total_production_cost.filter(|c| *c > Decimal::ZERO) {
        return Ok(SaleCost {
            source: CostSource::Precomputed,
            revenue,
            cost: stored,
            profit: revenue - stored,
            unit_cost: None,
        });
    }

    let linked = sale
        .production_batch_id
        .and_then(|id| batches.get(&id))
        .filter(|batch| batch.quantity > Decimal::ZERO);
    if let Some(batch) = linked {
        let unit = unit_cost_in(batch, &sale.currency, rates)?;
        let cost = unit.checked_mul(sale.quantity).ok_or(CostingError::Overflow)?;
        return Ok(SaleCost { source: CostSource::Batch, revenue, cost, profit: revenue - cost, unit_cost: Some(unit) });
    }

    let cost = revenue * ESTIMATED_COST_RATIO;
    Ok(SaleCost { source: CostSource::Estimated, revenue, cost, profit: revenue - cost, unit_cost: None })
}

#[cfg(test)]
#[path = "costing_test.rs"]
mod tests;
