//! Financial report aggregates: per-sale rows, KPI cards, inventory
//! valuation, and current-account balances.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;
use uuid::Uuid;

use super::costing::{CostSource, CostingError, money, resolve_sale_cost};
use super::rates::ExchangeRates;
use crate::model::{AccountTransaction, InventoryItem, ProductionBatch, Sale, TransactionKind};

// =============================================================================
// SALES REPORT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesReportRow {
    pub sale_id: Option<Uuid>,
    pub sale_date: Option<Date>,
    pub product_name: String,
    pub quantity: Decimal,
    pub currency: String,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
    pub margin_pct: Decimal,
    pub cost_source: CostSource,
    /// The same figures converted into the reporting currency.
    pub reporting_currency: String,
    pub reporting_revenue: Decimal,
    pub reporting_cost: Decimal,
    pub reporting_profit: Decimal,
}

/// One row per sale, newest first with undated sales last, with cost
/// resolved and converted.
///
/// # Errors
///
/// Returns a [`CostingError`] when a currency has no rate.
pub fn sales_report(
    sales: &[Sale],
    batches: &HashMap<Uuid, ProductionBatch>,
    rates: &ExchangeRates,
    reporting_currency: &str,
) -> Result<Vec<SalesReportRow>, CostingError> {
    let mut rows = Vec::with_capacity(sales.len());
    for sale in sales {
        let resolved = resolve_sale_cost(sale, batches, rates)?;
        let reporting_revenue = rates.convert(resolved.revenue, &sale.currency, reporting_currency)?;
        let reporting_cost = rates.convert(resolved.cost, &sale.currency, reporting_currency)?;
        rows.push(SalesReportRow {
            sale_id: sale.id,
            sale_date: sale.sale_date,
            product_name: sale.product_name.clone(),
            quantity: sale.quantity,
            currency: sale.currency.clone(),
            revenue: money(resolved.revenue),
            cost: money(resolved.cost),
            profit: money(resolved.profit),
            margin_pct: money(resolved.margin_pct()),
            cost_source: resolved.source,
            reporting_currency: reporting_currency.to_owned(),
            reporting_revenue: money(reporting_revenue),
            reporting_cost: money(reporting_cost),
            reporting_profit: money(reporting_revenue - reporting_cost),
        });
    }
    rows.sort_by_key(|row| Reverse(row.sale_date));
    Ok(rows)
}

// =============================================================================
// KPI SUMMARY
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceBreakdown {
    pub precomputed: usize,
    pub batch: usize,
    pub estimated: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KpiSummary {
    pub currency: String,
    pub sale_count: usize,
    pub revenue: Decimal,
    pub production_cost: Decimal,
    pub gross_profit: Decimal,
    pub margin_pct: Decimal,
    pub cost_sources: SourceBreakdown,
}

/// Totals over report rows, in the rows' reporting currency.
#[must_use]
pub fn kpi_summary(rows: &[SalesReportRow], currency: &str) -> KpiSummary {
    let mut revenue = Decimal::ZERO;
    let mut cost = Decimal::ZERO;
    let mut sources = SourceBreakdown::default();
    for row in rows {
        revenue += row.reporting_revenue;
        cost += row.reporting_cost;
        match row.cost_source {
            CostSource::Precomputed => sources.precomputed += 1,
            CostSource::Batch => sources.batch += 1,
            CostSource::Estimated => sources.estimated += 1,
        }
    }
    let profit = revenue - cost;
    KpiSummary {
        currency: currency.to_owned(),
        sale_count: rows.len(),
        revenue: money(revenue),
        production_cost: money(cost),
        gross_profit: money(profit),
        margin_pct: money(super::costing::margin_pct(profit, revenue)),
        cost_sources: sources,
    }
}

// =============================================================================
// INVENTORY VALUATION
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryValuation {
    pub currency: String,
    pub total: Decimal,
    pub by_type: BTreeMap<&'static str, Decimal>,
    /// Names of items at or below their critical level.
    pub below_critical: Vec<String>,
}

/// Stock on hand times unit cost, converted and grouped by item type.
///
/// # Errors
///
/// Returns `UnknownCurrency` when an item's currency has no rate.
pub fn inventory_valuation(
    items: &[InventoryItem],
    rates: &ExchangeRates,
    currency: &str,
) -> Result<InventoryValuation, CostingError> {
    let mut total = Decimal::ZERO;
    let mut by_type: BTreeMap<&'static str, Decimal> = BTreeMap::new();
    let mut below_critical = Vec::new();
    for item in items {
        let value = rates.convert(item.stock_quantity * item.unit_cost, &item.currency, currency)?;
        total += value;
        *by_type.entry(item.item_type.as_str()).or_default() += value;
        if item.is_below_critical() {
            below_critical.push(item.name.clone());
        }
    }
    for value in by_type.values_mut() {
        *value = money(*value);
    }
    Ok(InventoryValuation { currency: currency.to_owned(), total: money(total), by_type, below_critical })
}

// =============================================================================
// CURRENT ACCOUNTS
// =============================================================================

/// Credits minus debits. Positive means the account is owed money.
#[must_use]
pub fn account_balance(transactions: &[AccountTransaction]) -> Decimal {
    transactions
        .iter()
        .map(|tx| match tx.kind {
            TransactionKind::Credit => tx.amount,
            TransactionKind::Debit => -tx.amount,
        })
        .sum()
}

#[cfg(test)]
#[path = "report_test.rs"]
mod tests;
