use axum::body::to_bytes;
use serde_json::json;

use super::*;
use crate::model::Role;
use crate::routes::auth::test_auth;
use crate::state::test_helpers::{MockRemote, test_app_state};

fn seed_batch(mock: &MockRemote, lot: &str, recipe_id: Option<Uuid>) -> Uuid {
    let id = Uuid::new_v4();
    mock.seed(
        "production_batches",
        vec![json!({
            "id": id, "lot_number": lot, "recipe_id": recipe_id, "quantity": 200.0, "unit": "kg",
            "currency": "TRY", "raw_material_cost": 1000.0, "status": "In QC",
            "production_date": "2024-06-03"
        })],
    );
    id
}

fn seed_recipe(mock: &MockRemote) -> Uuid {
    let recipe = Uuid::new_v4();
    let water = Uuid::new_v4();
    let sles = Uuid::new_v4();
    mock.seed("recipes", vec![json!({"id": recipe, "name": "Yüzey Temizleyici"})]);
    mock.seed(
        "recipe_ingredients",
        vec![
            json!({"id": Uuid::new_v4(), "recipe_id": recipe, "inventory_item_id": water, "percentage": 85.0, "position": 0}),
            json!({"id": Uuid::new_v4(), "recipe_id": recipe, "inventory_item_id": sles, "percentage": 15.0, "position": 1}),
        ],
    );
    mock.seed(
        "inventory",
        vec![
            json!({"id": water, "name": "Water", "type": "raw_material", "unit": "kg",
                   "stock_quantity": 1000.0, "unit_cost": 0.1, "currency": "TRY"}),
            json!({"id": sles, "name": "SLES 70%", "type": "raw_material", "unit": "kg",
                   "stock_quantity": 50.0, "unit_cost": 2.0, "currency": "USD"}),
        ],
    );
    recipe
}

async fn body_of(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

#[tokio::test]
async fn label_streams_as_pdf_attachment() {
    let (state, mock) = test_app_state();
    let recipe = seed_recipe(&mock);
    let id = seed_batch(&mock, "LOT-20240603-AB12", Some(recipe));
    let viewer = test_auth(&mock, "v@example.com", Role::Viewer);

    let response = batch_label(State(state), viewer, Path(id), Query(ArchiveParam::default())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_owned();
    assert_eq!(disposition, "attachment; filename=\"label-LOT-20240603-AB12.pdf\"");
    assert!(body_of(response).await.starts_with(b"%PDF"));
}

#[tokio::test]
async fn lot_numbers_outside_code39_are_unprocessable() {
    let (state, mock) = test_app_state();
    let id = seed_batch(&mock, "LOT_1", None);
    let viewer = test_auth(&mock, "v@example.com", Role::Viewer);
    let err = batch_label(State(state), viewer, Path(id), Query(ArchiveParam::default())).await.unwrap_err();
    assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err.code, "E_BARCODE");
}

#[tokio::test]
async fn work_order_needs_a_recipe() {
    let (state, mock) = test_app_state();
    let viewer = test_auth(&mock, "v@example.com", Role::Viewer);

    let bare = seed_batch(&mock, "LOT-1", None);
    let err = work_order(State(state.clone()), viewer.clone(), Path(bare), Query(ArchiveParam::default()))
        .await
        .unwrap_err();
    assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);

    let recipe = seed_recipe(&mock);
    let id = seed_batch(&mock, "LOT-2", Some(recipe));
    let response = work_order(State(state), viewer, Path(id), Query(ArchiveParam::default())).await.unwrap();
    assert!(body_of(response).await.starts_with(b"%PDF"));
}

#[tokio::test]
async fn archiving_requires_write_and_returns_signed_link() {
    let (state, mock) = test_app_state();
    let id = seed_batch(&mock, "LOT-3", None);
    mock.seed(
        "quality_tests",
        vec![json!({"id": Uuid::new_v4(), "batch_id": id, "parameter": "pH",
                    "spec_min": 6.0, "spec_max": 8.0, "measured_value": 7.1})],
    );

    let viewer = test_auth(&mock, "v@example.com", Role::Viewer);
    let err = certificate_of_analysis(State(state.clone()), viewer, Path(id), Query(ArchiveParam { archive: true }))
        .await
        .unwrap_err();
    assert_eq!(err.status, StatusCode::FORBIDDEN);
    assert_eq!(mock.object_count(), 0);

    let editor = test_auth(&mock, "e@example.com", Role::Editor);
    let response = certificate_of_analysis(State(state), editor, Path(id), Query(ArchiveParam { archive: true }))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let stored: serde_json::Value = serde_json::from_slice(&body_of(response).await).unwrap();
    assert_eq!(stored["bucket"], "documents");
    assert!(stored["url"].as_str().unwrap().contains("/object/sign/documents/"));
    assert_eq!(mock.object_count(), 1);
}

#[tokio::test]
async fn financial_report_pdf_uses_report_range() {
    let (state, mock) = test_app_state();
    mock.seed(
        "sales",
        vec![json!({"id": Uuid::new_v4(), "sale_date": "2024-02-10", "product_name": "Soap",
                    "quantity": 5.0, "unit_price": 20.0, "total_amount": 100.0, "currency": "USD"})],
    );
    let viewer = test_auth(&mock, "v@example.com", Role::Viewer);

    let response = financial_report(State(state.clone()), viewer.clone(), Query(FinancialPdfParams::default()))
        .await
        .unwrap();
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");

    let params = FinancialPdfParams { currency: Some("ZZZ".into()), ..FinancialPdfParams::default() };
    let err = financial_report(State(state), viewer, Query(params)).await.unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
}
