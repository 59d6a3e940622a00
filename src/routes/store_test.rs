use serde_json::json;

use super::*;
use crate::routes::auth::test_auth;
use crate::state::test_helpers::test_app_state;

#[tokio::test]
async fn negative_price_is_rejected() {
    let (state, mock) = test_app_state();
    let editor = test_auth(&mock, "e@example.com", Role::Editor);
    let product: Product = serde_json::from_value(json!({"name": "Mug", "price": -1.0, "currency": "TRY"})).unwrap();
    let err = create_product(State(state), editor, Json(product)).await.unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert_eq!(err.code, "E_NEGATIVE_PRICE");
    assert!(mock.rows("products").is_empty());
}

#[tokio::test]
async fn category_gets_slug_on_create() {
    let (state, mock) = test_app_state();
    let editor = test_auth(&mock, "e@example.com", Role::Editor);
    let category: Category = serde_json::from_value(json!({"name": "Ev Dekorasyonu"})).unwrap();
    let (status, Json(stored)) = create_category(State(state), editor, Json(category)).await.unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(stored.slug, "ev-dekorasyonu");
}

#[tokio::test]
async fn invalid_order_transition_is_conflict() {
    let (state, mock) = test_app_state();
    let id = Uuid::new_v4();
    mock.seed(
        "orders",
        vec![json!({"id": id, "order_number": "ORD-7", "customer_name": "Can", "status": "pending",
                    "total_amount": 90.0, "currency": "TRY"})],
    );
    let editor = test_auth(&mock, "e@example.com", Role::Editor);

    let body = OrderStatusBody { status: OrderStatus::Delivered, tracking_number: None };
    let err = update_order_status(State(state.clone()), editor.clone(), Path(id), Json(body)).await.unwrap_err();
    assert_eq!(err.status, StatusCode::CONFLICT);

    let body = OrderStatusBody { status: OrderStatus::Processing, tracking_number: None };
    let Json(order) = update_order_status(State(state), editor, Path(id), Json(body)).await.unwrap();
    assert_eq!(order.status, OrderStatus::Processing);
}

#[tokio::test]
async fn settings_require_admin() {
    let (state, mock) = test_app_state();
    let editor = test_auth(&mock, "e@example.com", Role::Editor);
    let admin = test_auth(&mock, "a@example.com", Role::Admin);

    let body = SettingBody { value: json!("Free shipping over 500 TL") };
    let err = put_setting(State(state.clone()), editor.clone(), Path("banner".into()), Json(body)).await.unwrap_err();
    assert_eq!(err.status, StatusCode::FORBIDDEN);

    let body = SettingBody { value: json!("Free shipping over 500 TL") };
    put_setting(State(state.clone()), admin, Path("banner".into()), Json(body)).await.unwrap();
    let Json(settings) = list_settings(State(state), editor).await.unwrap();
    assert_eq!(settings.len(), 1);
}

#[tokio::test]
async fn role_management() {
    let (state, mock) = test_app_state();
    let admin = test_auth(&mock, "a@example.com", Role::Admin);
    let target = Uuid::new_v4();

    let body = AssignRoleBody { role: "superuser".into(), email: None };
    let err = assign_role(State(state.clone()), admin.clone(), Path(target), Json(body)).await.unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);

    let body = AssignRoleBody { role: "Editor".into(), email: Some("t@example.com".into()) };
    let Json(row) = assign_role(State(state.clone()), admin.clone(), Path(target), Json(body)).await.unwrap();
    assert_eq!(row.role, Role::Editor);

    let err = revoke_role(State(state.clone()), admin.clone(), Path(admin.user.id)).await.unwrap_err();
    assert_eq!(err.status, StatusCode::FORBIDDEN);
    let body = AssignRoleBody { role: "viewer".into(), email: None };
    let err = assign_role(State(state.clone()), admin.clone(), Path(admin.user.id), Json(body)).await.unwrap_err();
    assert_eq!(err.status, StatusCode::FORBIDDEN);
    assert_eq!(err.code, "E_SELF_DEMOTE");
    assert_eq!(roles::role_for(state.store(), &admin.token, admin.user.id).await.unwrap(), Role::Admin);
    assert_eq!(revoke_role(State(state.clone()), admin.clone(), Path(target)).await.unwrap(), StatusCode::NO_CONTENT);

    let Json(rows) = list_roles(State(state), admin).await.unwrap();
    assert!(rows.iter().all(|r| r.user_id != target));
}
