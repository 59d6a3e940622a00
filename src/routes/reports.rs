//! Financial report routes.

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use serde::Serialize;

use super::auth::AuthUser;
use super::erp::{CurrencyParam, rates_for};
use super::{api_error, costing_status, entity_status, remote_status};
use crate::error::ApiError;
use crate::finance::report::InventoryValuation;
use crate::services::reports::{self, FinancialReport, ReportError, ReportRange};
use crate::services::roles::Permission;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/reports/financial", get(financial))
        .route("/api/reports/inventory-valuation", get(inventory_valuation))
        .route("/api/reports/currencies", get(currencies))
}

pub(crate) fn report_error_to_api(err: ReportError) -> ApiError {
    let status = match &err {
        ReportError::InvertedRange => StatusCode::BAD_REQUEST,
        ReportError::Costing(e) => costing_status(e),
        ReportError::Entity(e) => entity_status(e),
        ReportError::Remote(e) => remote_status(e),
    };
    api_error(status, &err)
}

/// Build the report every financial screen shares: sales rows with their
/// resolved cost tier plus the KPI summary over them.
pub(crate) async fn build_financial(
    state: &AppState,
    auth: &AuthUser,
    range: &ReportRange,
) -> Result<FinancialReport, ApiError> {
    let rates = rates_for(state, &auth.token).await?;
    reports::financial_report(state.store(), &auth.token, range, &rates, &state.config.reporting_currency)
        .await
        .map_err(report_error_to_api)
}

/// `GET /api/reports/financial?from=2024-01-01&to=2024-03-31&currency=USD`
pub async fn financial(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(range): Query<ReportRange>,
) -> Result<Json<FinancialReport>, ApiError> {
    auth.require(Permission::Read)?;
    Ok(Json(build_financial(&state, &auth, &range).await?))
}

/// `GET /api/reports/inventory-valuation?currency=TRY`
pub async fn inventory_valuation(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(param): Query<CurrencyParam>,
) -> Result<Json<InventoryValuation>, ApiError> {
    auth.require(Permission::Read)?;
    let rates = rates_for(&state, &auth.token).await?;
    let currency = param.currency.unwrap_or_else(|| state.config.reporting_currency.clone());
    let valuation = reports::inventory_valuation(state.store(), &auth.token, &rates, &currency)
        .await
        .map_err(report_error_to_api)?;
    Ok(Json(valuation))
}

#[derive(Debug, Serialize)]
pub struct CurrencyList {
    pub reporting_currency: String,
    pub currencies: Vec<String>,
}

/// `GET /api/reports/currencies`: codes with a known rate.
pub async fn currencies(State(state): State<AppState>, auth: AuthUser) -> Result<Json<CurrencyList>, ApiError> {
    auth.require(Permission::Read)?;
    let rates = rates_for(&state, &auth.token).await?;
    Ok(Json(CurrencyList {
        reporting_currency: state.config.reporting_currency.clone(),
        currencies: rates.currencies().into_iter().map(str::to_owned).collect(),
    }))
}

#[cfg(test)]
#[path = "reports_test.rs"]
mod tests;
