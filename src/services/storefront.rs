//! Storefront rules layered over plain CRUD: order status flow, category
//! slugs, coupon sanity checks, and key/value site settings.

use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

use super::entity::{self, Entity, EntityError};
use crate::model::{Category, Coupon, Order, OrderStatus, Product, Setting, slugify};
use crate::remote::{self, Query, RemoteError, RemoteStore};

pub const SETTINGS_TABLE: &str = "settings";

#[derive(Debug, thiserror::Error)]
pub enum StorefrontError {
    #[error("order cannot move from {from} to {to}")]
    InvalidTransition { from: &'static str, to: &'static str },
    #[error("{0} is required")]
    Required(&'static str),
    #[error("discount must be between 0 and 100, got {0}")]
    InvalidDiscount(Decimal),
    #[error("price cannot be negative")]
    NegativePrice,
    #[error("coupon window ends before it starts")]
    InvertedWindow,
    #[error(transparent)]
    Entity(#[from] EntityError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl crate::error::ErrorCode for StorefrontError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "E_INVALID_TRANSITION",
            Self::Required(_) => "E_REQUIRED",
            Self::InvalidDiscount(_) => "E_INVALID_DISCOUNT",
            Self::NegativePrice => "E_NEGATIVE_PRICE",
            Self::InvertedWindow => "E_COUPON_WINDOW",
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

// =============================================================================
// LISTINGS
// =============================================================================

/// # Errors
///
/// Returns `Required` or `NegativePrice`.
pub fn validate_product(product: &Product) -> Result<(), StorefrontError> {
    if product.name.trim().is_empty() {
        return Err(StorefrontError::Required("name"));
    }
    if product.price < Decimal::ZERO {
        return Err(StorefrontError::NegativePrice);
    }
    Ok(())
}

// =============================================================================
// ORDERS
// =============================================================================

/// Move an order to `next`, optionally recording a tracking number.
///
/// # Errors
///
/// Returns `InvalidTransition`, `NotFound`, or the remote error.
pub async fn update_order_status(
    store: &dyn RemoteStore,
    token: &str,
    id: Uuid,
    next: OrderStatus,
    tracking_number: Option<String>,
) -> Result<Order, StorefrontError> {
    let order: Order = entity::get(store, token, id).await?;
    if !order.status.can_transition_to(next) {
        return Err(StorefrontError::InvalidTransition { from: order.status.as_str(), to: next.as_str() });
    }
    let mut patch = serde_json::json!({ "status": next.as_str() });
    if let Some(tracking) = tracking_number.filter(|t| !t.trim().is_empty()) {
        patch["tracking_number"] = Value::String(tracking);
    }
    let updated: Vec<Order> = remote::update_where(store, token, Order::TABLE, &Query::new().eq("id", id), &patch).await?;
    let order = updated
        .into_iter()
        .next()
        .ok_or(EntityError::NotFound { table: Order::TABLE, id })?;
    tracing::info!(order = %order.order_number, status = next.as_str(), "order status changed");
    Ok(order)
}

// =============================================================================
// CATEGORIES
// =============================================================================

/// Fill a blank slug from the name.
///
/// # Errors
///
/// Returns `Required` when the name is blank.
pub fn prepare_category(mut category: Category) -> Result<Category, StorefrontError> {
    if category.name.trim().is_empty() {
        return Err(StorefrontError::Required("name"));
    }
    category.slug = if category.slug.trim().is_empty() { slugify(&category.name) } else { slugify(&category.slug) };
    category.id = None;
    Ok(category)
}

// =============================================================================
// COUPONS
// =============================================================================

/// Upper-case the code and check discount and window.
///
/// # Errors
///
/// Returns `Required`, `InvalidDiscount`, or `InvertedWindow`.
pub fn prepare_coupon(mut coupon: Coupon) -> Result<Coupon, StorefrontError> {
    coupon.code = coupon.code.trim().to_uppercase();
    if coupon.code.is_empty() {
        return Err(StorefrontError::Required("code"));
    }
    if coupon.discount_percent <= Decimal::ZERO || coupon.discount_percent > Decimal::ONE_HUNDRED {
        return Err(StorefrontError::InvalidDiscount(coupon.discount_percent));
    }
    if let (Some(from), Some(until)) = (coupon.valid_from, coupon.valid_until) {
        if until < from {
            return Err(StorefrontError::InvertedWindow);
        }
    }
    coupon.id = None;
    Ok(coupon)
}

// =============================================================================
// SETTINGS
// =============================================================================

/// # Errors
///
/// Returns the remote error if the fetch fails.
pub async fn list_settings(store: &dyn RemoteStore, token: &str) -> Result<Vec<Setting>, StorefrontError> {
    Ok(remote::fetch(store, token, SETTINGS_TABLE, &Query::new().order("key", true)).await?)
}

/// Write `value` under `key`, inserting the row when it does not exist yet.
///
/// # Errors
///
/// Returns `Required` for a blank key, or the remote error.
pub async fn upsert_setting(store: &dyn RemoteStore, token: &str, key: &str, value: Value) -> Result<Setting, StorefrontError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(StorefrontError::Required("key"));
    }
    let row = Setting { key: key.to_owned(), value };
    let updated: Vec<Setting> =
        remote::update_where(store, token, SETTINGS_TABLE, &Query::new().eq("key", key), &row).await?;
    match updated.into_iter().next() {
        Some(setting) => Ok(setting),
        None => Ok(remote::insert_one(store, token, SETTINGS_TABLE, &row).await?),
    }
}

#[cfg(test)]
#[path = "storefront_test.rs"]
mod tests;
