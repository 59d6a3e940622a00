use serde_json::json;

use super::*;
use crate::model::{Customer, Role};
use crate::routes::auth::test_auth;
use crate::state::test_helpers::test_app_state;

fn customer(name: &str, segment: &str) -> Customer {
    serde_json::from_value(json!({"name": name, "segment": segment})).unwrap()
}

#[tokio::test]
async fn editor_creates_then_lists_with_filter() {
    let (state, mock) = test_app_state();
    let editor = test_auth(&mock, "e@example.com", Role::Editor);

    let (status, Json(created)) =
        create::<Customer>(State(state.clone()), editor.clone(), Json(customer("Ayşe Yılmaz", "wholesale")))
            .await
            .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert!(created.id.is_some());
    create::<Customer>(State(state.clone()), editor.clone(), Json(customer("Mehmet Kaya", "retail")))
        .await
        .unwrap();

    let filter = ListFilter { tag: Some("wholesale".into()), ..ListFilter::default() };
    let Json(rows) = list::<Customer>(State(state), editor, Query(filter)).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Ayşe Yılmaz");
}

#[tokio::test]
async fn viewer_can_read_but_not_write() {
    let (state, mock) = test_app_state();
    let viewer = test_auth(&mock, "v@example.com", Role::Viewer);
    assert!(list::<Customer>(State(state.clone()), viewer.clone(), Query(ListFilter::default())).await.is_ok());

    let err = create::<Customer>(State(state), viewer, Json(customer("X", "retail"))).await.unwrap_err();
    assert_eq!(err.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn update_and_delete_unknown_rows_are_404() {
    let (state, mock) = test_app_state();
    let editor = test_auth(&mock, "e@example.com", Role::Editor);
    let id = Uuid::new_v4();

    let err = get::<Customer>(State(state.clone()), editor.clone(), Path(id)).await.unwrap_err();
    assert_eq!(err.status, StatusCode::NOT_FOUND);
    let err = update::<Customer>(State(state.clone()), editor.clone(), Path(id), Json(customer("X", "retail")))
        .await
        .unwrap_err();
    assert_eq!(err.status, StatusCode::NOT_FOUND);
    let err = delete::<Customer>(State(state), editor, Path(id)).await.unwrap_err();
    assert_eq!(err.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn failed_write_surfaces_as_bad_gateway() {
    let (state, mock) = test_app_state();
    mock.fail_writes("customers");
    let editor = test_auth(&mock, "e@example.com", Role::Editor);
    let err = create::<Customer>(State(state), editor, Json(customer("X", "retail"))).await.unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_GATEWAY);
}
