use rust_decimal::Decimal;
use time::macros::date;

use super::*;
use crate::model::{ItemType, PurchaseStatus};

fn purchase(supplier: &str, item: &str, day: Date, status: PurchaseStatus) -> Purchase {
    Purchase {
        id: None,
        supplier_name: supplier.into(),
        inventory_item_id: None,
        item_name: item.into(),
        quantity: Decimal::ONE,
        unit_price: Decimal::ONE,
        currency: "TRY".into(),
        status,
        order_date: day,
        received_date: None,
    }
}

fn item(name: &str, item_type: ItemType) -> InventoryItem {
    InventoryItem {
        id: None,
        name: name.into(),
        item_type,
        unit: "kg".into(),
        stock_quantity: Decimal::ZERO,
        unit_cost: Decimal::ZERO,
        currency: "USD".into(),
        critical_level: None,
        supplier: Some("Acme Chemicals".into()),
    }
}

#[test]
fn empty_filter_keeps_everything() {
    let rows = vec![item("a", ItemType::Packaging), item("b", ItemType::RawMaterial)];
    assert!(ListFilter::default().is_empty());
    assert_eq!(ListFilter::default().apply(rows).len(), 2);
}

#[test]
fn text_search_is_case_insensitive_over_all_fields() {
    let rows = vec![item("Sodium Hydroxide", ItemType::RawMaterial), item("Jerrycan 5L", ItemType::Packaging)];
    let by_name = ListFilter { q: Some("hydrox".into()), ..ListFilter::default() };
    assert_eq!(by_name.apply(rows.clone()).len(), 1);
    let by_supplier = ListFilter { q: Some("ACME".into()), ..ListFilter::default() };
    assert_eq!(by_supplier.apply(rows).len(), 2);
}

#[test]
fn blank_text_search_is_ignored() {
    let filter = ListFilter { q: Some("   ".into()), ..ListFilter::default() };
    assert!(filter.is_empty());
}

#[test]
fn tag_matches_type_string() {
    let rows = vec![item("a", ItemType::Packaging), item("b", ItemType::RawMaterial)];
    let filter = ListFilter { tag: Some("raw_material".into()), ..ListFilter::default() };
    let kept = filter.apply(rows);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].name, "b");
}

#[test]
fn date_range_is_inclusive_on_both_ends() {
    let rows = vec![
        purchase("A", "x", date!(2024 - 01 - 31), PurchaseStatus::Ordered),
        purchase("B", "x", date!(2024 - 02 - 01), PurchaseStatus::Ordered),
        purchase("C", "x", date!(2024 - 02 - 29), PurchaseStatus::Received),
        purchase("D", "x", date!(2024 - 03 - 01), PurchaseStatus::Received),
    ];
    let filter = ListFilter { from: Some(date!(2024 - 02 - 01)), to: Some(date!(2024 - 02 - 29)), ..ListFilter::default() };
    let kept: Vec<String> = filter.apply(rows).into_iter().map(|p| p.supplier_name).collect();
    assert_eq!(kept, vec!["B", "C"]);
}

#[test]
fn date_filter_excludes_undated_records() {
    let filter = ListFilter { from: Some(date!(2024 - 01 - 01)), ..ListFilter::default() };
    assert!(!filter.matches(&item("a", ItemType::Packaging)));
}

#[test]
fn filters_combine() {
    let rows = vec![
        purchase("Acme", "NaOH", date!(2024 - 02 - 01), PurchaseStatus::Ordered),
        purchase("Acme", "NaOH", date!(2024 - 02 - 02), PurchaseStatus::Received),
        purchase("Other", "NaOH", date!(2024 - 02 - 03), PurchaseStatus::Received),
    ];
    let filter = ListFilter { q: Some("acme".into()), tag: Some("received".into()), ..ListFilter::default() };
    let kept = filter.apply(rows);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].order_date, date!(2024 - 02 - 02));
}

#[test]
fn parent_filter_matches_owner_id() {
    let id = Uuid::new_v4();
    let mut linked = purchase("A", "x", date!(2024 - 01 - 01), PurchaseStatus::Ordered);
    linked.inventory_item_id = Some(id);
    let other = purchase("B", "x", date!(2024 - 01 - 01), PurchaseStatus::Ordered);
    let filter = ListFilter { parent: Some(id), ..ListFilter::default() };
    assert_eq!(filter.apply(vec![linked, other]).len(), 1);
}

#[test]
fn deserializes_aliases_from_json() {
    let filter: ListFilter = serde_json::from_value(serde_json::json!({
        "status": "pending",
        "from": "2024-01-01",
        "active": true
    }))
    .unwrap();
    assert_eq!(filter.tag.as_deref(), Some("pending"));
    assert_eq!(filter.from, Some(date!(2024 - 01 - 01)));
    assert_eq!(filter.active, Some(true));
}

#[test]
fn expired_coupons_are_not_active() {
    let coupon = |until: &str| -> Coupon {
        serde_json::from_value(serde_json::json!({
            "code": "YAZ10", "discount_percent": 10.0, "valid_until": until
        }))
        .unwrap()
    };
    let filter = ListFilter { active: Some(true), ..ListFilter::default() };
    let kept = filter.apply(vec![coupon("2000-01-01"), coupon("2999-12-31")]);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].valid_until.map(|d| d.year()), Some(2999));
}
