use uuid::Uuid;

use super::*;
use crate::state::test_helpers::test_app_state;

#[test]
fn router_builds_without_route_conflicts() {
    let (state, _mock) = test_app_state();
    let _router = app(state);
}

#[test]
fn remote_status_mapping() {
    assert_eq!(remote_status(&RemoteError::Unauthorized), StatusCode::UNAUTHORIZED);
    assert_eq!(remote_status(&RemoteError::Conflict("dup".into())), StatusCode::CONFLICT);
    assert_eq!(remote_status(&RemoteError::Request("timeout".into())), StatusCode::BAD_GATEWAY);
    assert_eq!(
        remote_status(&RemoteError::Response { status: 404, body: String::new() }),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        remote_status(&RemoteError::Response { status: 503, body: String::new() }),
        StatusCode::BAD_GATEWAY
    );
}

#[test]
fn entity_not_found_maps_to_404() {
    let err = entity_error_to_api(EntityError::NotFound { table: "products", id: Uuid::nil() });
    assert_eq!(err.status, StatusCode::NOT_FOUND);
    assert_eq!(err.code, "E_NOT_FOUND");
}

#[tokio::test]
async fn healthz_is_ok() {
    assert_eq!(healthz().await, StatusCode::OK);
}

#[test]
fn costing_status_mapping() {
    assert_eq!(costing_status(&CostingError::UnknownCurrency("XYZ".into())), StatusCode::BAD_REQUEST);
    assert_eq!(
        costing_status(&CostingError::NonPositiveQuantity { lot: "LOT-1".into() }),
        StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(costing_status(&CostingError::Overflow), StatusCode::INTERNAL_SERVER_ERROR);
}
