use rust_decimal::Decimal;
use serde_json::json;
use time::macros::date;
use uuid::Uuid;

use super::*;
use crate::model::Role;
use crate::routes::auth::test_auth;
use crate::state::test_helpers::{MockRemote, test_app_state};

fn seed_sales(mock: &MockRemote) {
    let batch = Uuid::new_v4();
    mock.seed(
        "production_batches",
        vec![json!({
            "id": batch, "lot_number": "LOT-9", "quantity": 20.0, "unit": "kg", "currency": "USD",
            "raw_material_cost": 100.0, "packaging_cost": 20.0, "shipping_cost": 5.0,
            "overhead_cost": 10.0, "financing_cost": 5.0, "status": "Completed"
        })],
    );
    mock.seed(
        "sales",
        vec![
            json!({"id": Uuid::new_v4(), "sale_date": "2024-01-15", "product_name": "Cleaner",
                   "quantity": 10.0, "unit_price": 20.0, "total_amount": 200.0, "currency": "USD",
                   "production_batch_id": batch}),
            json!({"id": Uuid::new_v4(), "sale_date": "2024-02-10", "product_name": "Soap",
                   "quantity": 5.0, "unit_price": 20.0, "total_amount": 100.0, "currency": "USD",
                   "total_production_cost": 40.0}),
            json!({"id": Uuid::new_v4(), "sale_date": "2024-03-05", "product_name": "Degreaser",
                   "quantity": 1.0, "unit_price": 100.0, "total_amount": 100.0, "currency": "USD"}),
        ],
    );
}

#[tokio::test]
async fn financial_report_defaults_to_reporting_currency() {
    let (state, mock) = test_app_state();
    seed_sales(&mock);
    let viewer = test_auth(&mock, "v@example.com", Role::Viewer);

    let Json(report) = financial(State(state), viewer, Query(ReportRange::default())).await.unwrap();
    assert_eq!(report.currency, "USD");
    assert_eq!(report.kpi.sale_count, 3);
    assert_eq!(report.kpi.revenue, Decimal::from(400));
    // 70 from the batch, 40 precomputed, 70 estimated
    assert_eq!(report.kpi.production_cost, Decimal::from(180));
    assert_eq!(report.kpi.cost_sources.estimated, 1);
}

#[tokio::test]
async fn date_window_narrows_the_rows() {
    let (state, mock) = test_app_state();
    seed_sales(&mock);
    let viewer = test_auth(&mock, "v@example.com", Role::Viewer);
    let range = ReportRange { from: Some(date!(2024 - 02 - 01)), to: Some(date!(2024 - 02 - 28)), currency: None };

    let Json(report) = financial(State(state), viewer, Query(range)).await.unwrap();
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].product_name, "Soap");
}

#[tokio::test]
async fn sale_without_a_date_does_not_break_the_report() {
    let (state, mock) = test_app_state();
    seed_sales(&mock);
    let mut sales = mock.rows("sales");
    sales.push(json!({"id": Uuid::new_v4(), "sale_date": null, "product_name": "Wax",
                      "quantity": 1.0, "unit_price": 10.0, "total_amount": 10.0, "currency": "USD"}));
    mock.seed("sales", sales);
    let viewer = test_auth(&mock, "v@example.com", Role::Viewer);

    let Json(report) = financial(State(state), viewer, Query(ReportRange::default())).await.unwrap();
    assert_eq!(report.kpi.sale_count, 4);
    assert_eq!(report.rows.last().map(|r| r.product_name.as_str()), Some("Wax"));
    assert_eq!(report.rows.last().and_then(|r| r.sale_date), None);
}

#[tokio::test]
async fn bad_ranges_and_currencies_are_client_errors() {
    let (state, mock) = test_app_state();
    let viewer = test_auth(&mock, "v@example.com", Role::Viewer);

    let range = ReportRange { from: Some(date!(2024 - 03 - 01)), to: Some(date!(2024 - 01 - 01)), currency: None };
    let err = financial(State(state.clone()), viewer.clone(), Query(range)).await.unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert_eq!(err.code, "E_REPORT_RANGE");

    let range = ReportRange { currency: Some("GBP".into()), ..ReportRange::default() };
    let err = financial(State(state), viewer, Query(range)).await.unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert_eq!(err.code, "E_UNKNOWN_CURRENCY");
}

#[tokio::test]
async fn inventory_valuation_in_requested_currency() {
    let (state, mock) = test_app_state();
    mock.seed(
        "inventory",
        vec![
            json!({"id": Uuid::new_v4(), "name": "Water", "type": "raw_material", "unit": "kg",
                   "stock_quantity": 100.0, "unit_cost": 1.0, "currency": "USD"}),
            json!({"id": Uuid::new_v4(), "name": "Bottle", "type": "packaging", "unit": "pcs",
                   "stock_quantity": 30.0, "unit_cost": 3.0, "currency": "TRY", "critical_level": 50.0}),
        ],
    );
    let viewer = test_auth(&mock, "v@example.com", Role::Viewer);

    let param = CurrencyParam { currency: Some("TRY".into()) };
    let Json(valuation) = inventory_valuation(State(state), viewer, Query(param)).await.unwrap();
    assert_eq!(valuation.currency, "TRY");
    assert_eq!(valuation.total, Decimal::from(3090));
    assert_eq!(valuation.below_critical, vec!["Bottle".to_owned()]);
}

#[tokio::test]
async fn currencies_merge_table_and_fallback() {
    let (state, mock) = test_app_state();
    mock.seed("exchange_rates", vec![json!({"currency": "EUR", "rate": 0.92})]);
    let viewer = test_auth(&mock, "v@example.com", Role::Viewer);
    let Json(list) = currencies(State(state), viewer).await.unwrap();
    assert_eq!(list.reporting_currency, "USD");
    assert_eq!(list.currencies, vec!["EUR", "TRY", "USD"]);
}
