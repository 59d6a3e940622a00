//! Financial report service: fetches sales, batches, and rates, then
//! hands them to the pure aggregates in `finance::report`.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use super::entity::{self, Entity, EntityError};
use crate::finance::report::{self, InventoryValuation, KpiSummary, SalesReportRow};
use crate::finance::{CostingError, ExchangeRates};
use crate::model::{ExchangeRate, InventoryItem, ProductionBatch, Sale, normalize_currency};
use crate::remote::{self, Query, RemoteError, RemoteStore};

pub const RATES_TABLE: &str = "exchange_rates";

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("report range starts after it ends")]
    InvertedRange,
    #[error(transparent)]
    Costing(#[from] CostingError),
    #[error(transparent)]
    Entity(#[from] EntityError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl crate::error::ErrorCode for ReportError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvertedRange => "E_REPORT_RANGE",
            Self::Costing(e) => e.error_code(),
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

/// Date window and currency for a report. Missing bounds are open.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportRange {
    #[serde(default)]
    pub from: Option<Date>,
    #[serde(default)]
    pub to: Option<Date>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinancialReport {
    pub from: Option<Date>,
    pub to: Option<Date>,
    pub currency: String,
    pub kpi: KpiSummary,
    pub rows: Vec<SalesReportRow>,
}

/// Rates from the `exchange_rates` table over the configured fallback.
///
/// # Errors
///
/// Returns the remote error if the fetch fails.
pub async fn load_rates(
    store: &dyn RemoteStore,
    token: &str,
    fallback: &BTreeMap<String, Decimal>,
) -> Result<ExchangeRates, RemoteError> {
    let rows: Vec<ExchangeRate> = remote::fetch(store, token, RATES_TABLE, &Query::new()).await?;
    Ok(ExchangeRates::from_rows(&rows, fallback))
}

/// Sales in the range plus every batch they link to.
async fn sales_with_batches(
    store: &dyn RemoteStore,
    token: &str,
    range: &ReportRange,
) -> Result<(Vec<Sale>, HashMap<Uuid, ProductionBatch>), ReportError> {
    let mut query = Query::new().order("sale_date", false);
    if let Some(from) = range.from {
        query = query.gte("sale_date", from);
    }
    if let Some(to) = range.to {
        query = query.lte("sale_date", to);
    }
    let sales: Vec<Sale> = entity::list_where(store, token, &query).await?;

    let mut batch_ids: Vec<Uuid> = sales.iter().filter_map(|s| s.production_batch_id).collect();
    batch_ids.sort_unstable();
    batch_ids.dedup();
    let batches: Vec<ProductionBatch> = if batch_ids.is_empty() {
        Vec::new()
    } else {
        entity::list_where(store, token, &Query::new().in_list("id", &batch_ids)).await?
    };
    let by_id = batches
        .into_iter()
        .filter_map(|b| b.id.map(|id| (id, b)))
        .collect();
    Ok((sales, by_id))
}

/// Sales rows with resolved costs plus the KPI summary over them.
///
/// # Errors
///
/// Returns `InvertedRange`, `UnknownCurrency`, or the remote error.
pub async fn financial_report(
    store: &dyn RemoteStore,
    token: &str,
    range: &ReportRange,
    rates: &ExchangeRates,
    default_currency: &str,
) -> Result<FinancialReport, ReportError> {
    if let (Some(from), Some(to)) = (range.from, range.to) {
        if from > to {
            return Err(ReportError::InvertedRange);
        }
    }
    let currency = normalize_currency(range.currency.as_deref().unwrap_or(default_currency));
    rates.rate(&currency)?;

    let (sales, batches) = sales_with_batches(store, token, range).await?;
    let rows = report::sales_report(&sales, &batches, rates, &currency)?;
    let kpi = report::kpi_summary(&rows, &currency);
    tracing::info!(
        table = Sale::TABLE,
        sales = kpi.sale_count,
        estimated = kpi.cost_sources.estimated,
        "financial report built"
    );
    Ok(FinancialReport { from: range.from, to: range.to, currency, kpi, rows })
}

/// Stock value per item type in `currency`.
///
/// # Errors
///
/// Returns `UnknownCurrency` or the remote error.
pub async fn inventory_valuation(
    store: &dyn RemoteStore,
    token: &str,
    rates: &ExchangeRates,
    currency: &str,
) -> Result<InventoryValuation, ReportError> {
    let items: Vec<InventoryItem> = entity::list(store, token).await?;
    Ok(report::inventory_valuation(&items, rates, &normalize_currency(currency))?)
}

#[cfg(test)]
#[path = "reports_test.rs"]
mod tests;
