//! Stock history: signed movements that adjust inventory on hand.
//!
//! ERROR HANDLING
//! ==============
//! The movement row is written first, then the item's `stock_quantity`
//! is patched. The two calls are not atomic: if the patch fails the
//! movement stays recorded and the error is returned.
//!
//! Editing an item never changes its stock directly. A record whose
//! `stock_quantity` differs from the stored one is rejected, so every
//! change on hand leaves a movement behind.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::entity::{self, Entity, EntityError};
use crate::model::{InventoryItem, StockMovement};
use crate::remote::{self, Query, RemoteError, RemoteStore};

#[derive(Debug, thiserror::Error)]
pub enum StockError {
    #[error("stock movement of zero")]
    ZeroChange,
    #[error("{item} has {on_hand} on hand, cannot remove {requested}")]
    Insufficient { item: String, on_hand: Decimal, requested: Decimal },
    #[error("stock quantity cannot be negative")]
    NegativeStock,
    #[error("stock of {item} changes only through stock movements")]
    DirectChange { item: String },
    #[error(transparent)]
    Entity(#[from] EntityError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl crate::error::ErrorCode for StockError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ZeroChange => "E_STOCK_ZERO",
            Self::Insufficient { .. } => "E_STOCK_INSUFFICIENT",
            Self::NegativeStock => "E_NEGATIVE_STOCK",
            Self::DirectChange { .. } => "E_STOCK_VIA_MOVEMENT",
            Self::Entity(e) => e.error_code(),
            Self::Remote(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Entity(e) => e.retryable(),
            Self::Remote(e) => e.retryable(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MovementResult {
    pub movement: StockMovement,
    pub stock_quantity: Decimal,
    pub below_critical: bool,
}

/// Record a movement and apply it to the item's stock.
///
/// # Errors
///
/// Returns `ZeroChange` or `Insufficient` before writing, `NotFound`, or the remote error.
pub async fn record_movement(
    store: &dyn RemoteStore,
    token: &str,
    movement: &StockMovement,
) -> Result<MovementResult, StockError> {
    if movement.quantity_change.is_zero() {
        return Err(StockError::ZeroChange);
    }
    let mut item: InventoryItem = entity::get(store, token, movement.inventory_item_id).await?;
    let next = item.stock_quantity + movement.quantity_change;
    if next < Decimal::ZERO {
        return Err(StockError::Insufficient {
            item: item.name,
            on_hand: item.stock_quantity,
            requested: -movement.quantity_change,
        });
    }

    let mut row = movement.clone();
    row.id = None;
    row.created_at = None;
    let stored: StockMovement = remote::insert_one(store, token, StockMovement::TABLE, &row).await?;

    let patch = serde_json::json!({ "stock_quantity": next });
    let query = Query::new().eq("id", movement.inventory_item_id);
    let _: Vec<InventoryItem> = remote::update_where(store, token, InventoryItem::TABLE, &query, &patch)
        .await
        .inspect_err(|e| {
            tracing::error!(item = %movement.inventory_item_id, error = %e, "movement recorded but stock not updated");
        })?;
    item.stock_quantity = next;
    tracing::info!(item = %item.name, change = %movement.quantity_change, reason = movement.reason.as_str(), "stock moved");
    Ok(MovementResult { movement: stored, stock_quantity: next, below_critical: item.is_below_critical() })
}

/// Create an inventory item with its opening stock.
///
/// # Errors
///
/// Returns `NegativeStock` before writing, or the remote error.
pub async fn create_item(store: &dyn RemoteStore, token: &str, item: &InventoryItem) -> Result<InventoryItem, StockError> {
    if item.stock_quantity < Decimal::ZERO {
        return Err(StockError::NegativeStock);
    }
    Ok(entity::create(store, token, item).await?)
}

/// Replace an item's record, keeping its stock as stored.
///
/// # Errors
///
/// Returns `NegativeStock` or `DirectChange` before writing, `NotFound`, or
/// the remote error.
pub async fn update_item(
    store: &dyn RemoteStore,
    token: &str,
    id: Uuid,
    item: &InventoryItem,
) -> Result<InventoryItem, StockError> {
    if item.stock_quantity < Decimal::ZERO {
        return Err(StockError::NegativeStock);
    }
    let stored: InventoryItem = entity::get(store, token, id).await?;
    if item.stock_quantity != stored.stock_quantity {
        return Err(StockError::DirectChange { item: stored.name });
    }
    Ok(entity::update(store, token, id, item).await?)
}

/// Movements for one item, newest first.
///
/// # Errors
///
/// Returns the remote error if the fetch fails.
pub async fn history(store: &dyn RemoteStore, token: &str, item_id: Uuid) -> Result<Vec<StockMovement>, StockError> {
    let query = Query::new().eq("inventory_item_id", item_id).order("created_at", false);
    Ok(entity::list_where(store, token, &query).await?)
}

#[cfg(test)]
#[path = "stock_test.rs"]
mod tests;
