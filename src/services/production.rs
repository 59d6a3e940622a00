//! Production service: planning batches, advancing their status, and
//! reporting unit cost.
//!
//! DESIGN
//! ======
//! Planning a batch from a recipe prefills `raw_material_cost` with the
//! recipe roll-up at current inventory prices, converted into the batch
//! currency. The remaining cost buckets come from the caller.
//!
//! Status moves `Planned -> In QC -> Completed` and never backwards. The
//! last step requires a passing QC verdict for the batch. Editing a batch
//! record cannot change its status.
//!
//! Lot numbers are printed as Code 39 barcodes, so a lot number is
//! rejected up front when it holds a character outside that set.

use std::collections::HashMap;

use rand::Rng;
use rand::distr::Alphanumeric;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use super::entity::{self, Entity, EntityError};
use super::quality::{self, QcVerdict, QualityError};
use super::recipe::{self, RecipeError};
use crate::export::pdf::barcode;
use crate::finance::costing::{self, money};
use crate::finance::{CostingError, ExchangeRates};
use crate::model::{BatchStatus, InventoryItem, ProductionBatch, normalize_currency};
use crate::remote::{self, Query, RemoteError, RemoteStore};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ProductionError {
    #[error("batch not found: {0}")]
    NotFound(Uuid),
    #[error("batch quantity must be positive")]
    NonPositiveQuantity,
    #[error("lot number {0:?} cannot be printed as a barcode")]
    InvalidLotNumber(String),
    #[error("cannot move batch from {from} to {to}")]
    InvalidTransition { from: &'static str, to: &'static str },
    #[error("quality control verdict is {}", .0.as_str())]
    QcNotPassed(QcVerdict),
    #[error(transparent)]
    Recipe(#[from] RecipeError),
    #[error(transparent)]
    Quality(#[from] QualityError),
    #[error(transparent)]
    Costing(#[from] CostingError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl crate::error::ErrorCode for ProductionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_BATCH_NOT_FOUND",
            Self::NonPositiveQuantity => "E_NON_POSITIVE_QUANTITY",
            Self::InvalidLotNumber(_) => "E_INVALID_LOT_NUMBER",
            Self::InvalidTransition { .. } => "E_INVALID_TRANSITION",
            Self::QcNotPassed(_) => "E_QC_NOT_PASSED",
            Self::Recipe(e) => e.error_code(),
            Self::Quality(e) => e.error_code(),
            Self::Costing(e) => e.error_code(),
            Self::Remote(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Recipe(e) => e.retryable(),
            Self::Quality(e) => e.retryable(),
            Self::Remote(e) => e.retryable(),
            _ => false,
        }
    }
}

impl From<EntityError> for ProductionError {
    fn from(err: EntityError) -> Self {
        match err {
            EntityError::NotFound { id, .. } => Self::NotFound(id),
            EntityError::Remote(e) => Self::Remote(e),
        }
    }
}

/// Input for planning a new batch.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchPlan {
    #[serde(default)]
    pub lot_number: Option<String>,
    #[serde(default)]
    pub recipe_id: Option<Uuid>,
    pub quantity: Decimal,
    pub unit: String,
    pub currency: String,
    #[serde(default)]
    pub packaging_cost: Decimal,
    #[serde(default)]
    pub shipping_cost: Decimal,
    #[serde(default)]
    pub overhead_cost: Decimal,
    #[serde(default)]
    pub financing_cost: Decimal,
    #[serde(default)]
    pub production_date: Option<Date>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitCost {
    pub batch_id: Uuid,
    pub lot_number: String,
    pub currency: String,
    pub total_cost: Decimal,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
}

// =============================================================================
// PLANNING
// =============================================================================

/// `LOT-YYYYMMDD-XXXX` with a random upper-case suffix.
#[must_use]
pub fn generate_lot_number(day: Date) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(4)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    format!("LOT-{:04}{:02}{:02}-{suffix}", day.year(), u8::from(day.month()), day.day())
}

fn check_lot_number(lot: &str) -> Result<(), ProductionError> {
    if barcode::is_encodable(lot) {
        Ok(())
    } else {
        Err(ProductionError::InvalidLotNumber(lot.to_owned()))
    }
}

/// Raw-material cost of `quantity` units of a recipe, in `currency`.
///
/// # Errors
///
/// Returns a recipe lookup error, a costing error, or the remote error.
pub async fn recipe_rollup(
    store: &dyn RemoteStore,
    token: &str,
    recipe_id: Uuid,
    quantity: Decimal,
    currency: &str,
    rates: &ExchangeRates,
) -> Result<Decimal, ProductionError> {
    let recipe = recipe::get_recipe(store, token, recipe_id).await?;
    let ids: Vec<Uuid> = recipe.ingredients.iter().map(|l| l.inventory_item_id).collect();
    let items: Vec<InventoryItem> = if ids.is_empty() {
        Vec::new()
    } else {
        remote::fetch(store, token, "inventory", &Query::new().in_list("id", &ids)).await?
    };
    let by_id: HashMap<Uuid, InventoryItem> = items
        .into_iter()
        .filter_map(|item| item.id.map(|id| (id, item)))
        .collect();
    Ok(costing::raw_material_rollup(quantity, currency, &recipe.ingredients, &by_id, rates)?)
}

/// Create a `Planned` batch, prefilling raw-material cost from the recipe.
///
/// # Errors
///
/// Returns `NonPositiveQuantity` or `InvalidLotNumber` before writing, a
/// roll-up error, or the remote error.
pub async fn plan_batch(
    store: &dyn RemoteStore,
    token: &str,
    plan: BatchPlan,
    rates: &ExchangeRates,
    today: Date,
) -> Result<ProductionBatch, ProductionError> {
    if plan.quantity <= Decimal::ZERO {
        return Err(ProductionError::NonPositiveQuantity);
    }
    let requested_lot = plan
        .lot_number
        .map(|lot| lot.trim().to_owned())
        .filter(|lot| !lot.is_empty());
    if let Some(lot) = &requested_lot {
        check_lot_number(lot)?;
    }
    let currency = normalize_currency(&plan.currency);
    let raw_material_cost = match plan.recipe_id {
        Some(recipe_id) => money(recipe_rollup(store, token, recipe_id, plan.quantity, &currency, rates).await?),
        None => Decimal::ZERO,
    };
    let production_date = plan.production_date.unwrap_or(today);
    let lot_number = requested_lot.unwrap_or_else(|| generate_lot_number(production_date));
    let batch = ProductionBatch {
        id: None,
        lot_number,
        recipe_id: plan.recipe_id,
        quantity: plan.quantity,
        unit: plan.unit,
        currency,
        raw_material_cost,
        packaging_cost: plan.packaging_cost,
        shipping_cost: plan.shipping_cost,
        overhead_cost: plan.overhead_cost,
        financing_cost: plan.financing_cost,
        status: BatchStatus::Planned,
        production_date: Some(production_date),
        notes: plan.notes,
    };
    let stored = entity::create(store, token, &batch).await?;
    tracing::info!(lot = %stored.lot_number, %raw_material_cost, "batch planned");
    Ok(stored)
}

/// Replace a batch record. The status must match the stored one.
///
/// # Errors
///
/// Returns `NonPositiveQuantity`, `InvalidLotNumber`, `InvalidTransition`,
/// `NotFound`, or the remote error.
pub async fn update_batch(
    store: &dyn RemoteStore,
    token: &str,
    id: Uuid,
    batch: &ProductionBatch,
) -> Result<ProductionBatch, ProductionError> {
    if batch.quantity <= Decimal::ZERO {
        return Err(ProductionError::NonPositiveQuantity);
    }
    check_lot_number(&batch.lot_number)?;
    let stored: ProductionBatch = entity::get(store, token, id).await?;
    if batch.status != stored.status {
        return Err(ProductionError::InvalidTransition { from: stored.status.as_str(), to: batch.status.as_str() });
    }
    Ok(entity::update(store, token, id, batch).await?)
}

// =============================================================================
// STATUS
// =============================================================================

#[must_use]
pub fn can_advance(from: BatchStatus, to: BatchStatus) -> bool {
    matches!((from, to), (BatchStatus::Planned, BatchStatus::InQc) | (BatchStatus::InQc, BatchStatus::Completed))
}

/// Move a batch to `next`, checking the QC verdict before completion.
///
/// # Errors
///
/// Returns `InvalidTransition`, `QcNotPassed`, `NotFound`, or the remote error.
pub async fn advance_status(
    store: &dyn RemoteStore,
    token: &str,
    id: Uuid,
    next: BatchStatus,
) -> Result<ProductionBatch, ProductionError> {
    let batch: ProductionBatch = entity::get(store, token, id).await?;
    if !can_advance(batch.status, next) {
        return Err(ProductionError::InvalidTransition { from: batch.status.as_str(), to: next.as_str() });
    }
    if next == BatchStatus::Completed {
        let report = quality::evaluate_batch(store, token, id).await?;
        if report.verdict != QcVerdict::Pass {
            return Err(ProductionError::QcNotPassed(report.verdict));
        }
    }
    let patch = serde_json::json!({ "status": next.as_str() });
    let updated: Vec<ProductionBatch> =
        remote::update_where(store, token, ProductionBatch::TABLE, &Query::new().eq("id", id), &patch).await?;
    let batch = updated.into_iter().next().ok_or(ProductionError::NotFound(id))?;
    tracing::info!(lot = %batch.lot_number, status = next.as_str(), "batch status changed");
    Ok(batch)
}

// =============================================================================
// COST
// =============================================================================

/// Unit cost of a batch, optionally converted into `currency`.
///
/// # Errors
///
/// Returns `NotFound`, a costing error, or the remote error.
pub async fn unit_cost(
    store: &dyn RemoteStore,
    token: &str,
    id: Uuid,
    currency: Option<&str>,
    rates: &ExchangeRates,
) -> Result<UnitCost, ProductionError> {
    let batch: ProductionBatch = entity::get(store, token, id).await?;
    let target = currency.map_or_else(|| batch.currency.clone(), normalize_currency);
    let unit = costing::unit_cost_in(&batch, &target, rates)?;
    let total_cost = rates.convert(batch.costs().total(), &batch.currency, &target)?;
    Ok(UnitCost {
        batch_id: id,
        lot_number: batch.lot_number,
        currency: target,
        total_cost: money(total_cost),
        quantity: batch.quantity,
        unit_cost: money(unit),
    })
}

#[cfg(test)]
#[path = "production_test.rs"]
mod tests;
