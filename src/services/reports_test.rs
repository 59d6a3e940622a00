use serde_json::json;
use time::macros::date;

use super::*;
use crate::finance::CostSource;
use crate::state::test_helpers::MockRemote;

fn fallback() -> BTreeMap<String, Decimal> {
    let mut table = BTreeMap::new();
    table.insert("USD".to_owned(), Decimal::ONE);
    table.insert("TRY".to_owned(), Decimal::from(30));
    table
}

fn seed(mock: &MockRemote) -> Uuid {
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
            json!({"id": Uuid::new_v4(), "sale_date": "2024-02-01", "product_name": "Cleaner",
                   "quantity": 10.0, "unit_price": 300.0, "total_amount": 3000.0, "currency": "TRY",
                   "production_batch_id": batch}),
            json!({"id": Uuid::new_v4(), "sale_date": "2024-02-10", "product_name": "Soap",
                   "quantity": 5.0, "unit_price": 10.0, "total_amount": 50.0, "currency": "USD",
                   "total_production_cost": 20.0}),
            json!({"id": Uuid::new_v4(), "sale_date": "2024-03-05", "product_name": "Degreaser",
                   "quantity": 1.0, "unit_price": 100.0, "total_amount": 100.0, "currency": "USD"}),
        ],
    );
    batch
}

#[tokio::test]
async fn table_rates_override_fallback() {
    let mock = MockRemote::new();
    mock.seed(RATES_TABLE, vec![json!({"currency": "try", "rate": 40.0})]);
    let rates = load_rates(&mock, "t", &fallback()).await.unwrap();
    assert_eq!(rates.rate("TRY").unwrap(), Decimal::from(40));
    assert_eq!(rates.rate("USD").unwrap(), Decimal::ONE);
}

#[tokio::test]
async fn report_covers_all_three_tiers() {
    let mock = MockRemote::new();
    seed(&mock);
    let rates = ExchangeRates::new(&fallback());
    let report = financial_report(&mock, "t", &ReportRange::default(), &rates, "usd").await.unwrap();
    assert_eq!(report.currency, "USD");
    assert_eq!(report.rows.len(), 3);
    assert_eq!(report.rows[0].product_name, "Degreaser");
    let sources: Vec<CostSource> = report.rows.iter().map(|r| r.cost_source).collect();
    assert_eq!(sources, vec![CostSource::Estimated, CostSource::Precomputed, CostSource::Batch]);
    assert_eq!(report.kpi.revenue, Decimal::from(250));
    assert_eq!(report.kpi.production_cost, Decimal::from(160));
}

#[tokio::test]
async fn report_range_is_inclusive() {
    let mock = MockRemote::new();
    seed(&mock);
    let rates = ExchangeRates::new(&fallback());
    let range = ReportRange { from: Some(date!(2024 - 02 - 01)), to: Some(date!(2024 - 02 - 10)), currency: Some("TRY".into()) };
    let report = financial_report(&mock, "t", &range, &rates, "USD").await.unwrap();
    assert_eq!(report.rows.len(), 2);
    assert_eq!(report.currency, "TRY");
    // 3000 TRY + 50 USD (1500 TRY).
    assert_eq!(report.kpi.revenue, Decimal::from(4500));
}

#[tokio::test]
async fn inverted_range_and_unknown_currency_are_rejected() {
    let mock = MockRemote::new();
    let rates = ExchangeRates::new(&fallback());
    let range = ReportRange { from: Some(date!(2024 - 03 - 01)), to: Some(date!(2024 - 02 - 01)), currency: None };
    assert!(matches!(
        financial_report(&mock, "t", &range, &rates, "USD").await,
        Err(ReportError::InvertedRange)
    ));
    let range = ReportRange { currency: Some("GBP".into()), ..ReportRange::default() };
    assert!(matches!(
        financial_report(&mock, "t", &range, &rates, "USD").await,
        Err(ReportError::Costing(CostingError::UnknownCurrency(_)))
    ));
}

#[tokio::test]
async fn valuation_reads_inventory() {
    let mock = MockRemote::new();
    mock.seed(
        "inventory",
        vec![json!({"id": Uuid::new_v4(), "name": "NaOH", "type": "raw_material", "unit": "kg",
                    "stock_quantity": 10.0, "unit_cost": 60.0, "currency": "TRY"})],
    );
    let v = inventory_valuation(&mock, "t", &ExchangeRates::new(&fallback()), "usd").await.unwrap();
    assert_eq!(v.total, Decimal::from(20));
    assert_eq!(v.currency, "USD");
}
