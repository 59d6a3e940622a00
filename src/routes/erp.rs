//! ERP routes: inventory, recipes, production, quality control, sales,
//! purchasing, current accounts, and stock history.
//!
//! Plain tables mount the generic [`crud`] handlers. Records with rules
//! (recipes, batches, QC tests, ledgers, stock movements) go through
//! their service so validation runs before anything is written.

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use rust_decimal::Decimal;
use serde::Deserialize;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::auth::AuthUser;
use super::{api_error, costing_status, crud, entity_status, remote_error_to_api, remote_status};
use crate::error::ApiError;
use crate::finance::ExchangeRates;
use crate::model::{
    Account, AccountTransaction, BatchStatus, InventoryItem, ProductionBatch, Purchase, QualityTest, Recipe,
    RecipeWithIngredients, Sale, StockMovement, TransactionKind,
};
use crate::services::accounts::{self, AccountError, AccountSummary, Statement};
use crate::services::production::{self, BatchPlan, ProductionError, UnitCost};
use crate::services::quality::{self, QcReport, QualityError};
use crate::services::recipe::{self, RecipeError};
use crate::services::reports;
use crate::services::roles::Permission;
use crate::services::stock::{self, MovementResult, StockError};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/inventory", get(crud::list::<InventoryItem>).post(create_item))
        .route(
            "/api/inventory/{id}",
            get(crud::get::<InventoryItem>).patch(update_item).delete(crud::delete::<InventoryItem>),
        )
        .route("/api/inventory/{id}/movements", get(item_history))
        .route("/api/recipes", get(crud::list::<Recipe>).post(create_recipe))
        .route("/api/recipes/{id}", get(get_recipe).patch(update_recipe).delete(delete_recipe))
        .route("/api/production", get(crud::list::<ProductionBatch>).post(plan_batch))
        .route(
            "/api/production/{id}",
            get(crud::get::<ProductionBatch>).patch(update_batch).delete(crud::delete::<ProductionBatch>),
        )
        .route("/api/production/{id}/status", post(advance_batch))
        .route("/api/production/{id}/unit-cost", get(unit_cost))
        .route("/api/production/{id}/qc", get(evaluate_batch).post(record_test))
        .route("/api/sales", get(crud::list::<Sale>).post(crud::create::<Sale>))
        .route(
            "/api/sales/{id}",
            get(crud::get::<Sale>).patch(crud::update::<Sale>).delete(crud::delete::<Sale>),
        )
        .route("/api/purchases", get(crud::list::<Purchase>).post(crud::create::<Purchase>))
        .route(
            "/api/purchases/{id}",
            get(crud::get::<Purchase>).patch(crud::update::<Purchase>).delete(crud::delete::<Purchase>),
        )
        .route("/api/accounts", get(list_accounts).post(crud::create::<Account>))
        .route(
            "/api/accounts/{id}",
            get(account_statement).patch(crud::update::<Account>).delete(crud::delete::<Account>),
        )
        .route("/api/accounts/{id}/transactions", post(post_transaction))
        .route("/api/stock-movements", get(crud::list::<StockMovement>).post(record_movement))
}

// =============================================================================
// ERROR MAPPING
// =============================================================================

fn recipe_status(err: &RecipeError) -> StatusCode {
    match err {
        RecipeError::EmptyName
        | RecipeError::NoIngredients
        | RecipeError::InvalidPercentage { .. }
        | RecipeError::DuplicateIngredient(_)
        | RecipeError::PercentSum { .. } => StatusCode::BAD_REQUEST,
        RecipeError::NotFound(_) => StatusCode::NOT_FOUND,
        RecipeError::Remote(e) => remote_status(e),
    }
}

fn quality_status(err: &QualityError) -> StatusCode {
    match err {
        QualityError::EmptyParameter | QualityError::InvertedRange { .. } => StatusCode::BAD_REQUEST,
        QualityError::Remote(e) => remote_status(e),
    }
}

pub(crate) fn recipe_error_to_api(err: RecipeError) -> ApiError {
    api_error(recipe_status(&err), &err)
}

pub(crate) fn quality_error_to_api(err: QualityError) -> ApiError {
    api_error(quality_status(&err), &err)
}

pub(crate) fn production_error_to_api(err: ProductionError) -> ApiError {
    let status = match &err {
        ProductionError::NotFound(_) => StatusCode::NOT_FOUND,
        ProductionError::NonPositiveQuantity | ProductionError::InvalidLotNumber(_) => StatusCode::BAD_REQUEST,
        ProductionError::InvalidTransition { .. } | ProductionError::QcNotPassed(_) => StatusCode::CONFLICT,
        ProductionError::Recipe(e) => recipe_status(e),
        ProductionError::Quality(e) => quality_status(e),
        ProductionError::Costing(e) => costing_status(e),
        ProductionError::Remote(e) => remote_status(e),
    };
    api_error(status, &err)
}

fn account_error_to_api(err: AccountError) -> ApiError {
    let status = match &err {
        AccountError::NonPositiveAmount => StatusCode::BAD_REQUEST,
        AccountError::Entity(e) => entity_status(e),
        AccountError::Remote(e) => remote_status(e),
    };
    api_error(status, &err)
}

fn stock_error_to_api(err: StockError) -> ApiError {
    let status = match &err {
        StockError::ZeroChange | StockError::NegativeStock => StatusCode::BAD_REQUEST,
        StockError::Insufficient { .. } | StockError::DirectChange { .. } => StatusCode::CONFLICT,
        StockError::Entity(e) => entity_status(e),
        StockError::Remote(e) => remote_status(e),
    };
    api_error(status, &err)
}

/// Table rates over the configured fallback.
pub(crate) async fn rates_for(state: &AppState, token: &str) -> Result<ExchangeRates, ApiError> {
    reports::load_rates(state.store(), token, &state.config.fallback_rates)
        .await
        .map_err(remote_error_to_api)
}

// =============================================================================
// INVENTORY
// =============================================================================

/// `POST /api/inventory`: opening stock cannot be negative.
pub async fn create_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(item): Json<InventoryItem>,
) -> Result<(StatusCode, Json<InventoryItem>), ApiError> {
    auth.require(Permission::Write)?;
    let stored = stock::create_item(state.store(), &auth.token, &item)
        .await
        .map_err(stock_error_to_api)?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// `PATCH /api/inventory/{id}`. Stock on hand moves only through
/// `POST /api/stock-movements`.
pub async fn update_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(item): Json<InventoryItem>,
) -> Result<Json<InventoryItem>, ApiError> {
    auth.require(Permission::Write)?;
    let stored = stock::update_item(state.store(), &auth.token, id, &item)
        .await
        .map_err(stock_error_to_api)?;
    Ok(Json(stored))
}

/// `GET /api/inventory/{id}/movements`
pub async fn item_history(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<StockMovement>>, ApiError> {
    auth.require(Permission::Read)?;
    let rows = stock::history(state.store(), &auth.token, id)
        .await
        .map_err(stock_error_to_api)?;
    Ok(Json(rows))
}

// =============================================================================
// RECIPES
// =============================================================================

/// `GET /api/recipes/{id}` with its ingredient lines.
pub async fn get_recipe(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RecipeWithIngredients>, ApiError> {
    auth.require(Permission::Read)?;
    let recipe = recipe::get_recipe(state.store(), &auth.token, id)
        .await
        .map_err(recipe_error_to_api)?;
    Ok(Json(recipe))
}

/// `POST /api/recipes`. Rejected unless percentages sum to 100.
pub async fn create_recipe(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(draft): Json<RecipeWithIngredients>,
) -> Result<(StatusCode, Json<RecipeWithIngredients>), ApiError> {
    auth.require(Permission::Write)?;
    let stored = recipe::create_recipe(state.store(), &auth.token, &draft)
        .await
        .map_err(recipe_error_to_api)?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// `PATCH /api/recipes/{id}`
pub async fn update_recipe(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(draft): Json<RecipeWithIngredients>,
) -> Result<Json<RecipeWithIngredients>, ApiError> {
    auth.require(Permission::Write)?;
    let stored = recipe::update_recipe(state.store(), &auth.token, id, &draft)
        .await
        .map_err(recipe_error_to_api)?;
    Ok(Json(stored))
}

/// `DELETE /api/recipes/{id}`
pub async fn delete_recipe(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    auth.require(Permission::Write)?;
    recipe::delete_recipe(state.store(), &auth.token, id)
        .await
        .map_err(recipe_error_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// PRODUCTION
// =============================================================================

/// `POST /api/production`: plan a batch, prefilling raw-material cost.
pub async fn plan_batch(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(plan): Json<BatchPlan>,
) -> Result<(StatusCode, Json<ProductionBatch>), ApiError> {
    auth.require(Permission::Write)?;
    let rates = rates_for(&state, &auth.token).await?;
    let today = OffsetDateTime::now_utc().date();
    let batch = production::plan_batch(state.store(), &auth.token, plan, &rates, today)
        .await
        .map_err(production_error_to_api)?;
    Ok((StatusCode::CREATED, Json(batch)))
}

/// `PATCH /api/production/{id}`. The status is left to `/status`.
pub async fn update_batch(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(batch): Json<ProductionBatch>,
) -> Result<Json<ProductionBatch>, ApiError> {
    auth.require(Permission::Write)?;
    let stored = production::update_batch(state.store(), &auth.token, id, &batch)
        .await
        .map_err(production_error_to_api)?;
    Ok(Json(stored))
}

#[derive(Deserialize)]
pub struct BatchStatusBody {
    pub status: String,
}

/// `POST /api/production/{id}/status`
pub async fn advance_batch(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<BatchStatusBody>,
) -> Result<Json<ProductionBatch>, ApiError> {
    auth.require(Permission::Write)?;
    let Some(next) = BatchStatus::from_str(&body.status) else {
        return Err(ApiError::bad_request(format!("unknown batch status {:?}", body.status)));
    };
    let batch = production::advance_status(state.store(), &auth.token, id, next)
        .await
        .map_err(production_error_to_api)?;
    Ok(Json(batch))
}

#[derive(Debug, Default, Deserialize)]
pub struct CurrencyParam {
    #[serde(default)]
    pub currency: Option<String>,
}

/// `GET /api/production/{id}/unit-cost?currency=EUR`
pub async fn unit_cost(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(param): Query<CurrencyParam>,
) -> Result<Json<UnitCost>, ApiError> {
    auth.require(Permission::Read)?;
    let rates = rates_for(&state, &auth.token).await?;
    let cost = production::unit_cost(state.store(), &auth.token, id, param.currency.as_deref(), &rates)
        .await
        .map_err(production_error_to_api)?;
    Ok(Json(cost))
}

// =============================================================================
// QUALITY CONTROL
// =============================================================================

/// `GET /api/production/{id}/qc`: recorded tests and the batch verdict.
pub async fn evaluate_batch(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<QcReport>, ApiError> {
    auth.require(Permission::Read)?;
    let report = quality::evaluate_batch(state.store(), &auth.token, id)
        .await
        .map_err(quality_error_to_api)?;
    Ok(Json(report))
}

#[derive(Deserialize)]
pub struct QcTestBody {
    pub parameter: String,
    #[serde(default)]
    pub spec_min: Option<Decimal>,
    #[serde(default)]
    pub spec_max: Option<Decimal>,
    pub measured_value: Decimal,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// `POST /api/production/{id}/qc`
pub async fn record_test(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<QcTestBody>,
) -> Result<(StatusCode, Json<QualityTest>), ApiError> {
    auth.require(Permission::Write)?;
    let test = QualityTest {
        id: None,
        batch_id: id,
        parameter: body.parameter,
        spec_min: body.spec_min,
        spec_max: body.spec_max,
        measured_value: body.measured_value,
        unit: body.unit,
        notes: body.notes,
    };
    let stored = quality::record_test(state.store(), &auth.token, &test)
        .await
        .map_err(quality_error_to_api)?;
    Ok((StatusCode::CREATED, Json(stored)))
}

// =============================================================================
// CURRENT ACCOUNTS
// =============================================================================

/// `GET /api/accounts`: every account with its balance.
pub async fn list_accounts(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Vec<AccountSummary>>, ApiError> {
    auth.require(Permission::Read)?;
    let rows = accounts::list_with_balances(state.store(), &auth.token)
        .await
        .map_err(account_error_to_api)?;
    Ok(Json(rows))
}

/// `GET /api/accounts/{id}`
pub async fn account_statement(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Statement>, ApiError> {
    auth.require(Permission::Read)?;
    let statement = accounts::statement(state.store(), &auth.token, id)
        .await
        .map_err(account_error_to_api)?;
    Ok(Json(statement))
}

#[derive(Deserialize)]
pub struct TransactionBody {
    pub kind: TransactionKind,
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
    /// Defaults to today.
    #[serde(default)]
    pub transaction_date: Option<Date>,
}

/// `POST /api/accounts/{id}/transactions`
pub async fn post_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<TransactionBody>,
) -> Result<(StatusCode, Json<AccountTransaction>), ApiError> {
    auth.require(Permission::Write)?;
    let tx = AccountTransaction {
        id: None,
        account_id: id,
        kind: body.kind,
        amount: body.amount,
        description: body.description,
        transaction_date: body.transaction_date.unwrap_or_else(|| OffsetDateTime::now_utc().date()),
    };
    let stored = accounts::post_transaction(state.store(), &auth.token, &tx)
        .await
        .map_err(account_error_to_api)?;
    Ok((StatusCode::CREATED, Json(stored)))
}

// =============================================================================
// STOCK HISTORY
// =============================================================================

/// `POST /api/stock-movements`: record a movement and apply it to stock.
pub async fn record_movement(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(movement): Json<StockMovement>,
) -> Result<(StatusCode, Json<MovementResult>), ApiError> {
    auth.require(Permission::Write)?;
    let result = stock::record_movement(state.store(), &auth.token, &movement)
        .await
        .map_err(stock_error_to_api)?;
    Ok((StatusCode::CREATED, Json(result)))
}

#[cfg(test)]
#[path = "erp_test.rs"]
mod tests;
