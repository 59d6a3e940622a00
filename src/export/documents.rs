//! Printable documents: batch labels, work orders, certificates of analysis,
//! and the financial report.

use std::collections::HashMap;

use rust_decimal::Decimal;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::ExportError;
use super::pdf::layout::{Column, Header, Layout};
use crate::finance::costing::ESTIMATED_COST_RATIO;
use crate::model::{InventoryItem, ProductionBatch, RecipeWithIngredients};
use crate::services::quality::{QcReport, QcVerdict};
use crate::services::reports::FinancialReport;

/// Width of one Code 39 module on labels, in points.
const LABEL_MODULE: f32 = 1.2;
const LABEL_BAR_HEIGHT: f32 = 48.0;

fn amount(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

fn quantity(value: Decimal) -> String {
    value.normalize().to_string()
}

fn day(value: Option<Date>) -> String {
    value.map_or_else(|| "-".to_owned(), |d| d.to_string())
}

fn bound(value: Option<Decimal>) -> String {
    value.map_or_else(|| "-".to_owned(), quantity)
}

fn batch_grid(batch: &ProductionBatch, product: &str) -> Vec<(&'static str, String)> {
    vec![
        ("Lot number", batch.lot_number.clone()),
        ("Product", product.to_owned()),
        ("Quantity", format!("{} {}", quantity(batch.quantity), batch.unit)),
        ("Production date", day(batch.production_date)),
        ("Status", batch.status.as_str().to_owned()),
    ]
}

/// Label with lot details and a scannable lot-number barcode.
///
/// # Errors
///
/// Returns `Barcode` if the lot number has characters Code 39 cannot carry,
/// or `Pdf` if encoding fails.
pub fn batch_label(
    company: &str,
    batch: &ProductionBatch,
    product: &str,
    generated_at: OffsetDateTime,
) -> Result<Vec<u8>, ExportError> {
    let mut layout =
        Layout::new(Header { title: "Batch Label".into(), subtitle: company.to_owned() }, generated_at);
    layout.metadata_grid(&batch_grid(batch, product), 2);
    layout.spacer(6.0);
    layout.barcode(&batch.lot_number, LABEL_MODULE, LABEL_BAR_HEIGHT)?;
    layout.finish()
}

/// Production work order: the recipe scaled to the batch quantity.
///
/// # Errors
///
/// Returns `Pdf` if encoding fails.
pub fn work_order(
    company: &str,
    batch: &ProductionBatch,
    recipe: &RecipeWithIngredients,
    items: &HashMap<Uuid, InventoryItem>,
    generated_at: OffsetDateTime,
) -> Result<Vec<u8>, ExportError> {
    let mut layout = Layout::new(
        Header { title: format!("Work Order {}", batch.lot_number), subtitle: company.to_owned() },
        generated_at,
    );
    layout.metadata_grid(&batch_grid(batch, &recipe.recipe.name), 3);

    layout.heading("Ingredients");
    let mut lines: Vec<_> = recipe.ingredients.iter().collect();
    lines.sort_by_key(|line| line.position);
    let rows: Vec<Vec<String>> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let item = items.get(&line.inventory_item_id);
            let required = (batch.quantity * line.percentage / Decimal::ONE_HUNDRED).round_dp(3);
            vec![
                (i + 1).to_string(),
                item.map_or_else(|| line.inventory_item_id.to_string(), |it| it.name.clone()),
                quantity(line.percentage),
                quantity(required),
                item.map_or_else(|| batch.unit.clone(), |it| it.unit.clone()),
                item.map_or_else(|| "-".to_owned(), |it| quantity(it.stock_quantity)),
            ]
        })
        .collect();
    layout.table(
        &[
            Column::right("#", 0.5),
            Column::left("Ingredient", 4.0),
            Column::right("%", 1.2),
            Column::right("Required", 1.6),
            Column::left("Unit", 1.0),
            Column::right("On hand", 1.6),
        ],
        &rows,
    );

    if let Some(notes) = batch.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        layout.heading("Notes");
        layout.paragraph(notes);
    }
    layout.spacer(24.0);
    layout.paragraph("Prepared by: ______________________        Checked by: ______________________");
    layout.finish()
}

/// Certificate of analysis listing every QC measurement against its range.
///
/// # Errors
///
/// Returns `Pdf` if encoding fails.
pub fn certificate_of_analysis(
    company: &str,
    batch: &ProductionBatch,
    product: &str,
    qc: &QcReport,
    generated_at: OffsetDateTime,
) -> Result<Vec<u8>, ExportError> {
    let mut layout = Layout::new(
        Header { title: "Certificate of Analysis".into(), subtitle: company.to_owned() },
        generated_at,
    );
    layout.metadata_grid(&batch_grid(batch, product), 3);

    layout.heading("Test results");
    let rows: Vec<Vec<String>> = qc
        .tests
        .iter()
        .map(|line| {
            vec![
                line.test.parameter.clone(),
                bound(line.test.spec_min),
                bound(line.test.spec_max),
                quantity(line.test.measured_value),
                line.test.unit.clone().unwrap_or_default(),
                if line.passed { "PASS" } else { "FAIL" }.to_owned(),
            ]
        })
        .collect();
    layout.table(
        &[
            Column::left("Parameter", 3.0),
            Column::right("Min", 1.2),
            Column::right("Max", 1.2),
            Column::right("Result", 1.2),
            Column::left("Unit", 1.0),
            Column::left("Status", 1.0),
        ],
        &rows,
    );

    let verdict = match qc.verdict {
        QcVerdict::Pass => "PASS. The batch conforms to all listed specifications.",
        QcVerdict::Fail => "FAIL. One or more results are outside specification.",
        QcVerdict::Pending => "PENDING. No test results have been recorded for this batch.",
    };
    layout.heading("Conclusion");
    layout.paragraph(verdict);
    layout.finish()
}

/// Financial report: KPI summary followed by one row per sale.
///
/// # Errors
///
/// Returns `Pdf` if encoding fails.
pub fn financial_report(
    company: &str,
    report: &FinancialReport,
    generated_at: OffsetDateTime,
) -> Result<Vec<u8>, ExportError> {
    let period = match (report.from, report.to) {
        (None, None) => "All dates".to_owned(),
        (from, to) => format!("{} to {}", day(from), day(to)),
    };
    let mut layout = Layout::new(
        Header { title: "Financial Report".into(), subtitle: format!("{company} | {period} | {}", report.currency) },
        generated_at,
    );

    let kpi = &report.kpi;
    let sources = &kpi.cost_sources;
    layout.metadata_grid(
        &[
            ("Revenue", amount(kpi.revenue)),
            ("Production cost", amount(kpi.production_cost)),
            ("Gross profit", amount(kpi.gross_profit)),
            ("Margin", format!("{}%", amount(kpi.margin_pct))),
            ("Sales", kpi.sale_count.to_string()),
            (
                "Cost sources",
                format!("{} precomputed / {} batch / {} estimated", sources.precomputed, sources.batch, sources.estimated),
            ),
        ],
        3,
    );

    layout.heading("Sales");
    let rows: Vec<Vec<String>> = report
        .rows
        .iter()
        .map(|row| {
            vec![
                row.sale_date.map_or_else(|| "-".to_owned(), |day| day.to_string()),
                row.product_name.clone(),
                quantity(row.quantity),
                amount(row.reporting_revenue),
                amount(row.reporting_cost),
                amount(row.reporting_profit),
                format!("{}%", amount(row.margin_pct)),
                row.cost_source.as_str().to_owned(),
            ]
        })
        .collect();
    layout.table(
        &[
            Column::left("Date", 1.6),
            Column::left("Product", 3.0),
            Column::right("Qty", 0.9),
            Column::right("Revenue", 1.5),
            Column::right("Cost", 1.5),
            Column::right("Profit", 1.5),
            Column::right("Margin", 1.1),
            Column::left("Source", 1.4),
        ],
        &rows,
    );
    if sources.estimated > 0 {
        layout.paragraph(&format!(
            "Rows with source \"estimated\" have no production data; their cost is {}% of revenue.",
            (ESTIMATED_COST_RATIO * Decimal::ONE_HUNDRED).normalize()
        ));
    }
    layout.finish()
}

#[cfg(test)]
#[path = "documents_test.rs"]
mod tests;
