//! Generic list/get/create/update/delete handlers for plain tables.
//!
//! Route modules mount these per record type, e.g.
//! `get(crud::list::<Customer>).post(crud::create::<Customer>)`. Reads need
//! the read permission; everything else needs write.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use uuid::Uuid;

use super::auth::AuthUser;
use super::entity_error_to_api;
use crate::error::ApiError;
use crate::services::entity::{self, Entity};
use crate::services::filter::{Filterable, ListFilter};
use crate::services::roles::Permission;
use crate::state::AppState;

/// `GET /api/{table}`: every row, narrowed by the query-string filter.
pub async fn list<E: Entity + Filterable>(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<ListFilter>,
) -> Result<Json<Vec<E>>, ApiError> {
    auth.require(Permission::Read)?;
    let rows: Vec<E> = entity::list(state.store(), &auth.token)
        .await
        .map_err(entity_error_to_api)?;
    Ok(Json(filter.apply(rows)))
}

/// `GET /api/{table}/{id}`
pub async fn get<E: Entity>(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<E>, ApiError> {
    auth.require(Permission::Read)?;
    let row = entity::get(state.store(), &auth.token, id)
        .await
        .map_err(entity_error_to_api)?;
    Ok(Json(row))
}

/// `POST /api/{table}`
pub async fn create<E: Entity>(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(row): Json<E>,
) -> Result<(StatusCode, Json<E>), ApiError> {
    auth.require(Permission::Write)?;
    let stored = entity::create(state.store(), &auth.token, &row)
        .await
        .map_err(entity_error_to_api)?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// `PATCH /api/{table}/{id}`: the body is the full record.
pub async fn update<E: Entity>(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(row): Json<E>,
) -> Result<Json<E>, ApiError> {
    auth.require(Permission::Write)?;
    let stored = entity::update(state.store(), &auth.token, id, &row)
        .await
        .map_err(entity_error_to_api)?;
    Ok(Json(stored))
}

/// `DELETE /api/{table}/{id}`
pub async fn delete<E: Entity>(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    auth.require(Permission::Write)?;
    entity::delete::<E>(state.store(), &auth.token, id)
        .await
        .map_err(entity_error_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "crud_test.rs"]
mod tests;
