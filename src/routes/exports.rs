//! Spreadsheet export routes.
//!
//! `GET /api/export/{dataset}.csv` takes the same query-string filter as
//! the dataset's list route and returns the filtered rows as a CSV file.

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde_json::Value;

use super::auth::AuthUser;
use super::documents::export_error_to_api;
use super::entity_error_to_api;
use super::reports::build_financial;
use crate::error::ApiError;
use crate::export::sheet;
use crate::model::{
    Account, Category, Coupon, Customer, InventoryItem, Order, Product, ProductionBatch, Purchase, Recipe, Sale,
    StockMovement,
};
use crate::services::entity::{self, Entity};
use crate::services::filter::{Filterable, ListFilter};
use crate::services::reports::ReportRange;
use crate::services::roles::Permission;
use crate::state::AppState;

/// Dataset names accepted by the export route.
pub const DATASETS: &[&str] = &[
    "products",
    "orders",
    "categories",
    "coupons",
    "customers",
    "inventory",
    "recipes",
    "production",
    "sales",
    "purchases",
    "accounts",
    "stock-movements",
    "financial",
];

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/export/{file}", get(export))
}

async fn rows<E: Entity + Filterable>(state: &AppState, auth: &AuthUser, filter: &ListFilter) -> Result<Vec<Value>, ApiError> {
    let records: Vec<E> = entity::list(state.store(), &auth.token)
        .await
        .map_err(entity_error_to_api)?;
    sheet::rows_of(&filter.apply(records)).map_err(export_error_to_api)
}

/// `GET /api/export/{dataset}.csv`
pub async fn export(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(file): Path<String>,
    Query(filter): Query<ListFilter>,
) -> Result<Response, ApiError> {
    auth.require(Permission::Read)?;
    let name = file.strip_suffix(".csv").unwrap_or(&file);
    let data = match name {
        "products" => rows::<Product>(&state, &auth, &filter).await?,
        "orders" => rows::<Order>(&state, &auth, &filter).await?,
        "categories" => rows::<Category>(&state, &auth, &filter).await?,
        "coupons" => rows::<Coupon>(&state, &auth, &filter).await?,
        "customers" => rows::<Customer>(&state, &auth, &filter).await?,
        "inventory" => rows::<InventoryItem>(&state, &auth, &filter).await?,
        "recipes" => rows::<Recipe>(&state, &auth, &filter).await?,
        "production" => rows::<ProductionBatch>(&state, &auth, &filter).await?,
        "sales" => rows::<Sale>(&state, &auth, &filter).await?,
        "purchases" => rows::<Purchase>(&state, &auth, &filter).await?,
        "accounts" => rows::<Account>(&state, &auth, &filter).await?,
        "stock-movements" => rows::<StockMovement>(&state, &auth, &filter).await?,
        "financial" => {
            let range = ReportRange { from: filter.from, to: filter.to, currency: None };
            let report = build_financial(&state, &auth, &range).await?;
            sheet::rows_of(&report.rows).map_err(export_error_to_api)?
        }
        other => {
            return Err(ApiError::not_found(format!("unknown dataset {other:?}, expected one of {}", DATASETS.join(", "))));
        }
    };

    let bytes = sheet::to_csv(&data).map_err(export_error_to_api)?;
    tracing::info!(dataset = name, rows = data.len(), "export generated");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{name}.csv\"")),
        ],
        bytes,
    )
        .into_response())
}

#[cfg(test)]
#[path = "exports_test.rs"]
mod tests;
