use std::collections::BTreeMap;

use lopdf::Document;
use time::macros::{date, datetime};

use super::*;
use crate::finance::ExchangeRates;
use crate::finance::report::{kpi_summary, sales_report};
use crate::model::{BatchStatus, ItemType, QualityTest, Recipe, RecipeIngredient, Sale};
use crate::services::quality;

const AT: OffsetDateTime = datetime!(2024-05-02 09:30 UTC);

fn batch(lot: &str) -> ProductionBatch {
    ProductionBatch {
        id: Some(Uuid::new_v4()),
        lot_number: lot.into(),
        recipe_id: None,
        quantity: Decimal::from(200),
        unit: "kg".into(),
        currency: "TRY".into(),
        raw_material_cost: Decimal::from(1000),
        packaging_cost: Decimal::ZERO,
        shipping_cost: Decimal::ZERO,
        overhead_cost: Decimal::ZERO,
        financing_cost: Decimal::ZERO,
        status: BatchStatus::InQc,
        production_date: Some(date!(2024 - 05 - 01)),
        notes: Some("Mix at low speed.".into()),
    }
}

fn pages(bytes: &[u8]) -> usize {
    assert!(bytes.starts_with(b"%PDF"));
    Document::load_mem(bytes).unwrap().get_pages().len()
}

#[test]
fn label_carries_barcode() {
    let bytes = batch_label("Test Kimya", &batch("LOT-20240501-AB12"), "Degreaser", AT).unwrap();
    assert_eq!(pages(&bytes), 1);
}

#[test]
fn label_rejects_lot_number_outside_code39() {
    let err = batch_label("Test Kimya", &batch("LOT#1"), "Degreaser", AT).unwrap_err();
    assert!(matches!(err, ExportError::Barcode('#')));
}

#[test]
fn work_order_scales_recipe() {
    let water = Uuid::new_v4();
    let surfactant = Uuid::new_v4();
    let recipe = RecipeWithIngredients {
        recipe: Recipe { id: Some(Uuid::new_v4()), name: "Degreaser".into(), product_id: None, description: None },
        ingredients: vec![
            RecipeIngredient {
                id: None,
                recipe_id: None,
                inventory_item_id: surfactant,
                percentage: Decimal::from(30),
                position: 2,
            },
            RecipeIngredient { id: None, recipe_id: None, inventory_item_id: water, percentage: Decimal::from(70), position: 1 },
        ],
    };
    let items = HashMap::from([(
        water,
        InventoryItem {
            id: Some(water),
            name: "Deionized water".into(),
            item_type: ItemType::RawMaterial,
            unit: "kg".into(),
            stock_quantity: Decimal::from(5000),
            unit_cost: Decimal::ONE,
            currency: "TRY".into(),
            critical_level: None,
            supplier: None,
        },
    )]);
    let bytes = work_order("Test Kimya", &batch("LOT-1"), &recipe, &items, AT).unwrap();
    assert_eq!(pages(&bytes), 1);
}

#[test]
fn certificate_lists_results() {
    let b = batch("LOT-1");
    let batch_id = b.id.unwrap();
    let tests = vec![
        QualityTest {
            id: None,
            batch_id,
            parameter: "pH".into(),
            spec_min: Some(Decimal::from(6)),
            spec_max: Some(Decimal::from(8)),
            measured_value: Decimal::new(72, 1),
            unit: None,
            notes: None,
        },
        QualityTest {
            id: None,
            batch_id,
            parameter: "Density".into(),
            spec_min: Some(Decimal::ONE),
            spec_max: None,
            measured_value: Decimal::new(95, 2),
            unit: Some("g/ml".into()),
            notes: None,
        },
    ];
    let qc = quality::report(batch_id, tests);
    assert_eq!(qc.verdict, QcVerdict::Fail);
    let bytes = certificate_of_analysis("Test Kimya", &b, "Degreaser", &qc, AT).unwrap();
    assert_eq!(pages(&bytes), 1);
}

#[test]
fn financial_report_spans_pages_for_many_sales() {
    let rates = ExchangeRates::new(&BTreeMap::from([("TRY".to_owned(), Decimal::ONE)]));
    let sales: Vec<Sale> = (0..120)
        .map(|i| Sale {
            id: Some(Uuid::new_v4()),
            sale_date: Some(date!(2024 - 05 - 01)),
            customer_id: None,
            product_name: format!("Product {i}"),
            quantity: Decimal::ONE,
            unit_price: Decimal::from(100),
            total_amount: Decimal::from(100),
            currency: "TRY".into(),
            total_production_cost: None,
            production_batch_id: None,
        })
        .collect();
    let rows = sales_report(&sales, &HashMap::new(), &rates, "TRY").unwrap();
    let report = FinancialReport {
        from: Some(date!(2024 - 05 - 01)),
        to: Some(date!(2024 - 05 - 31)),
        currency: "TRY".into(),
        kpi: kpi_summary(&rows, "TRY"),
        rows,
    };
    let bytes = financial_report("Test Kimya", &report, AT).unwrap();
    assert!(pages(&bytes) >= 3);
}
