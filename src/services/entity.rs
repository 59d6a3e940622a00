//! Entity service: generic list/get/create/update/delete over one table.
//!
//! DESIGN
//! ======
//! Most admin screens are plain CRUD over a single remote table. Each
//! record type names its table and default ordering through [`Entity`];
//! the functions here do the rest. Screens with extra rules (recipes,
//! production, stock, accounts) have their own service modules that call
//! into these for the plain parts.

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::model::{
    Account, Category, Coupon, Customer, InventoryItem, Order, Product, ProductionBatch, Purchase, Recipe, Sale,
    StockMovement,
};
use crate::remote::{self, Query, RemoteError, RemoteStore};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    #[error("{table} row not found: {id}")]
    NotFound { table: &'static str, id: Uuid },
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl crate::error::ErrorCode for EntityError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "E_NOT_FOUND",
            Self::Remote(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::NotFound { .. } => false,
            Self::Remote(e) => e.retryable(),
        }
    }
}

/// A record stored in one remote table, keyed by a uuid `id` column.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    const TABLE: &'static str;
    /// Column and direction for unfiltered listings.
    const ORDER_BY: (&'static str, bool);
}

macro_rules! entity {
    ($ty:ty, $table:literal, $column:literal, $ascending:literal) => {
        impl Entity for $ty {
            const TABLE: &'static str = $table;
            const ORDER_BY: (&'static str, bool) = ($column, $ascending);
        }
    };
}

entity!(Product, "products", "created_at", false);
entity!(Category, "categories", "sort_order", true);
entity!(Order, "orders", "created_at", false);
entity!(Coupon, "coupons", "code", true);
entity!(Customer, "customers", "name", true);
entity!(InventoryItem, "inventory", "name", true);
entity!(Recipe, "recipes", "name", true);
entity!(ProductionBatch, "production_batches", "production_date", false);
entity!(Sale, "sales", "sale_date", false);
entity!(Purchase, "purchases", "order_date", false);
entity!(Account, "accounts", "name", true);
entity!(StockMovement, "stock_movements", "created_at", false);

// =============================================================================
// CRUD
// =============================================================================

/// Every row, in the entity's default order.
///
/// # Errors
///
/// Returns the remote error if the fetch fails.
pub async fn list<E: Entity>(store: &dyn RemoteStore, token: &str) -> Result<Vec<E>, EntityError> {
    let (column, ascending) = E::ORDER_BY;
    let query = Query::new().order(column, ascending);
    Ok(remote::fetch(store, token, E::TABLE, &query).await?)
}

/// Rows matching `query`, which should carry its own ordering.
///
/// # Errors
///
/// Returns the remote error if the fetch fails.
pub async fn list_where<E: Entity>(store: &dyn RemoteStore, token: &str, query: &Query) -> Result<Vec<E>, EntityError> {
    Ok(remote::fetch(store, token, E::TABLE, query).await?)
}

/// # Errors
///
/// Returns `NotFound` when no row has `id`.
pub async fn get<E: Entity>(store: &dyn RemoteStore, token: &str, id: Uuid) -> Result<E, EntityError> {
    remote::fetch_one(store, token, E::TABLE, Query::new().eq("id", id))
        .await?
        .ok_or(EntityError::NotFound { table: E::TABLE, id })
}

/// # Errors
///
/// Returns the remote error if the insert fails.
pub async fn create<E: Entity>(store: &dyn RemoteStore, token: &str, row: &E) -> Result<E, EntityError> {
    let stored: E = remote::insert_one(store, token, E::TABLE, row).await?;
    tracing::info!(table = E::TABLE, "row created");
    Ok(stored)
}

/// Overwrite the row with `id` using the fields of `row`.
///
/// # Errors
///
/// Returns `NotFound` when no row was updated.
pub async fn update<E: Entity>(store: &dyn RemoteStore, token: &str, id: Uuid, row: &E) -> Result<E, EntityError> {
    let query = Query::new().eq("id", id);
    let updated: Vec<E> = remote::update_where(store, token, E::TABLE, &query, row).await?;
    updated
        .into_iter()
        .next()
        .ok_or(EntityError::NotFound { table: E::TABLE, id })
}

/// # Errors
///
/// Returns `NotFound` when no row was deleted.
pub async fn delete<E: Entity>(store: &dyn RemoteStore, token: &str, id: Uuid) -> Result<(), EntityError> {
    let removed = store.delete(token, E::TABLE, &Query::new().eq("id", id)).await?;
    if removed.is_empty() {
        return Err(EntityError::NotFound { table: E::TABLE, id });
    }
    tracing::info!(table = E::TABLE, %id, "row deleted");
    Ok(())
}

#[cfg(test)]
#[path = "entity_test.rs"]
mod tests;
