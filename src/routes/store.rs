//! Storefront admin routes: listings, orders, categories, coupons, CRM,
//! settings, and role management.

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post, put};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::auth::{AuthUser, role_error_to_api};
use super::{api_error, crud, entity_error_to_api, entity_status, remote_status};
use crate::error::ApiError;
use crate::model::{Category, Coupon, Customer, Order, OrderStatus, Product, Role, Setting, UserRole};
use crate::services::entity;
use crate::services::roles::{self, Permission};
use crate::services::storefront::{self, StorefrontError};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(crud::list::<Product>).post(create_product))
        .route(
            "/api/products/{id}",
            get(crud::get::<Product>).patch(update_product).delete(crud::delete::<Product>),
        )
        .route("/api/orders", get(crud::list::<Order>))
        .route("/api/orders/{id}", get(crud::get::<Order>))
        .route("/api/orders/{id}/status", post(update_order_status))
        .route("/api/categories", get(crud::list::<Category>).post(create_category))
        .route("/api/categories/{id}", get(crud::get::<Category>).patch(update_category).delete(crud::delete::<Category>))
        .route("/api/coupons", get(crud::list::<Coupon>).post(create_coupon))
        .route("/api/coupons/{id}", get(crud::get::<Coupon>).patch(update_coupon).delete(crud::delete::<Coupon>))
        .route("/api/customers", get(crud::list::<Customer>).post(crud::create::<Customer>))
        .route(
            "/api/customers/{id}",
            get(crud::get::<Customer>).patch(crud::update::<Customer>).delete(crud::delete::<Customer>),
        )
        .route("/api/settings", get(list_settings))
        .route("/api/settings/{key}", put(put_setting))
        .route("/api/roles", get(list_roles))
        .route("/api/roles/{user_id}", put(assign_role).delete(revoke_role))
}

pub(crate) fn storefront_error_to_api(err: StorefrontError) -> ApiError {
    let status = match &err {
        StorefrontError::Entity(e) => entity_status(e),
        StorefrontError::InvalidTransition { .. } => StatusCode::CONFLICT,
        StorefrontError::Required(_)
        | StorefrontError::InvalidDiscount(_)
        | StorefrontError::NegativePrice
        | StorefrontError::InvertedWindow => StatusCode::BAD_REQUEST,
        StorefrontError::Remote(e) => remote_status(e),
    };
    api_error(status, &err)
}

// =============================================================================
// LISTINGS
// =============================================================================

/// `POST /api/products`
pub async fn create_product(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(product): Json<Product>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    auth.require(Permission::Write)?;
    storefront::validate_product(&product).map_err(storefront_error_to_api)?;
    let stored = entity::create(state.store(), &auth.token, &product)
        .await
        .map_err(entity_error_to_api)?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// `PATCH /api/products/{id}`
pub async fn update_product(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(product): Json<Product>,
) -> Result<Json<Product>, ApiError> {
    auth.require(Permission::Write)?;
    storefront::validate_product(&product).map_err(storefront_error_to_api)?;
    let stored = entity::update(state.store(), &auth.token, id, &product)
        .await
        .map_err(entity_error_to_api)?;
    Ok(Json(stored))
}

// =============================================================================
// ORDERS
// =============================================================================

#[derive(Deserialize)]
pub struct OrderStatusBody {
    pub status: OrderStatus,
    #[serde(default)]
    pub tracking_number: Option<String>,
}

/// `POST /api/orders/{id}/status`: move an order along its lifecycle.
pub async fn update_order_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<OrderStatusBody>,
) -> Result<Json<Order>, ApiError> {
    auth.require(Permission::Write)?;
    let order = storefront::update_order_status(state.store(), &auth.token, id, body.status, body.tracking_number)
        .await
        .map_err(storefront_error_to_api)?;
    Ok(Json(order))
}

// =============================================================================
// CATEGORIES + COUPONS
// =============================================================================

/// `POST /api/categories`: a blank slug is derived from the name.
pub async fn create_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(category): Json<Category>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    auth.require(Permission::Write)?;
    let category = storefront::prepare_category(category).map_err(storefront_error_to_api)?;
    let stored = entity::create(state.store(), &auth.token, &category)
        .await
        .map_err(entity_error_to_api)?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// `PATCH /api/categories/{id}`
pub async fn update_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(category): Json<Category>,
) -> Result<Json<Category>, ApiError> {
    auth.require(Permission::Write)?;
    let category = storefront::prepare_category(category).map_err(storefront_error_to_api)?;
    let stored = entity::update(state.store(), &auth.token, id, &category)
        .await
        .map_err(entity_error_to_api)?;
    Ok(Json(stored))
}

/// `POST /api/coupons`
pub async fn create_coupon(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(coupon): Json<Coupon>,
) -> Result<(StatusCode, Json<Coupon>), ApiError> {
    auth.require(Permission::Write)?;
    let coupon = storefront::prepare_coupon(coupon).map_err(storefront_error_to_api)?;
    let stored = entity::create(state.store(), &auth.token, &coupon)
        .await
        .map_err(entity_error_to_api)?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// `PATCH /api/coupons/{id}`
pub async fn update_coupon(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(coupon): Json<Coupon>,
) -> Result<Json<Coupon>, ApiError> {
    auth.require(Permission::Write)?;
    let coupon = storefront::prepare_coupon(coupon).map_err(storefront_error_to_api)?;
    let stored = entity::update(state.store(), &auth.token, id, &coupon)
        .await
        .map_err(entity_error_to_api)?;
    Ok(Json(stored))
}

// =============================================================================
// SETTINGS + ROLES
// =============================================================================

/// `GET /api/settings`
pub async fn list_settings(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Vec<Setting>>, ApiError> {
    auth.require(Permission::Read)?;
    let settings = storefront::list_settings(state.store(), &auth.token)
        .await
        .map_err(storefront_error_to_api)?;
    Ok(Json(settings))
}

#[derive(Deserialize)]
pub struct SettingBody {
    pub value: Value,
}

/// `PUT /api/settings/{key}`: admin only.
pub async fn put_setting(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(key): Path<String>,
    Json(body): Json<SettingBody>,
) -> Result<Json<Setting>, ApiError> {
    auth.require(Permission::Administer)?;
    let setting = storefront::upsert_setting(state.store(), &auth.token, &key, body.value)
        .await
        .map_err(storefront_error_to_api)?;
    Ok(Json(setting))
}

/// `GET /api/roles`: admin only.
pub async fn list_roles(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Vec<UserRole>>, ApiError> {
    auth.require(Permission::Administer)?;
    let rows = roles::list(state.store(), &auth.token).await.map_err(role_error_to_api)?;
    Ok(Json(rows))
}

#[derive(Deserialize)]
pub struct AssignRoleBody {
    pub role: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// `PUT /api/roles/{user_id}`: admin only.
pub async fn assign_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
    Json(body): Json<AssignRoleBody>,
) -> Result<Json<UserRole>, ApiError> {
    auth.require(Permission::Administer)?;
    let Some(role) = Role::from_str(&body.role) else {
        return Err(ApiError::bad_request(format!("unknown role {:?}", body.role)));
    };
    let row = roles::assign(state.store(), &auth.token, auth.user.id, user_id, role, body.email)
        .await
        .map_err(role_error_to_api)?;
    Ok(Json(row))
}

/// `DELETE /api/roles/{user_id}`: the user falls back to viewer.
pub async fn revoke_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    auth.require(Permission::Administer)?;
    roles::revoke(state.store(), &auth.token, auth.user.id, user_id)
        .await
        .map_err(role_error_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
