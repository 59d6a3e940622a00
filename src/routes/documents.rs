//! Printable document routes.
//!
//! Each route renders a PDF and streams it back as an attachment. With
//! `?archive=true` the PDF is stored in the private document bucket
//! instead and the response is the stored object with a signed link.

use std::collections::HashMap;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use serde::Deserialize;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::auth::AuthUser;
use super::erp::{quality_error_to_api, recipe_error_to_api};
use super::reports::build_financial;
use super::uploads::upload_error_to_api;
use super::{api_error, entity_error_to_api};
use crate::error::ApiError;
use crate::export::{ExportError, documents};
use crate::model::{InventoryItem, ProductionBatch, RecipeWithIngredients};
use crate::remote::Query as RemoteQuery;
use crate::services::reports::ReportRange;
use crate::services::roles::Permission;
use crate::services::{entity, quality, recipe, uploads};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/documents/batches/{id}/label.pdf", get(batch_label))
        .route("/api/documents/batches/{id}/work-order.pdf", get(work_order))
        .route("/api/documents/batches/{id}/coa.pdf", get(certificate_of_analysis))
        .route("/api/documents/financial-report.pdf", get(financial_report))
}

pub(crate) fn export_error_to_api(err: ExportError) -> ApiError {
    let status = match &err {
        ExportError::Barcode(_) | ExportError::EmptyBarcode => StatusCode::UNPROCESSABLE_ENTITY,
        ExportError::Csv(_) | ExportError::Serialize(_) | ExportError::Pdf(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, &err)
}

#[derive(Debug, Default, Deserialize)]
pub struct ArchiveParam {
    #[serde(default)]
    pub archive: bool,
}

fn pdf_response(file_name: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_owned()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{file_name}\"")),
        ],
        bytes,
    )
        .into_response()
}

/// Stream the PDF, or archive it and return the stored object.
async fn deliver(
    state: &AppState,
    auth: &AuthUser,
    file_name: &str,
    bytes: Vec<u8>,
    archive: bool,
) -> Result<Response, ApiError> {
    if !archive {
        return Ok(pdf_response(file_name, bytes));
    }
    auth.require(Permission::Write)?;
    let storage = &state.config.storage;
    let stored = uploads::archive_document(
        state.store(),
        &auth.token,
        &storage.document_bucket,
        file_name,
        bytes,
        storage.signed_url_ttl_secs,
    )
    .await
    .map_err(upload_error_to_api)?;
    Ok((StatusCode::CREATED, Json(stored)).into_response())
}

/// The batch and, when it has one, its recipe.
async fn load_batch(
    state: &AppState,
    auth: &AuthUser,
    id: Uuid,
) -> Result<(ProductionBatch, Option<RecipeWithIngredients>), ApiError> {
    let batch: ProductionBatch = entity::get(state.store(), &auth.token, id)
        .await
        .map_err(entity_error_to_api)?;
    let recipe = match batch.recipe_id {
        Some(recipe_id) => Some(
            recipe::get_recipe(state.store(), &auth.token, recipe_id)
                .await
                .map_err(recipe_error_to_api)?,
        ),
        None => None,
    };
    Ok((batch, recipe))
}

fn product_name(recipe: Option<&RecipeWithIngredients>) -> String {
    recipe.map_or_else(|| "-".to_owned(), |r| r.recipe.name.clone())
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

// =============================================================================
// BATCH DOCUMENTS
// =============================================================================

/// `GET /api/documents/batches/{id}/label.pdf`
pub async fn batch_label(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(param): Query<ArchiveParam>,
) -> Result<Response, ApiError> {
    auth.require(Permission::Read)?;
    let (batch, recipe) = load_batch(&state, &auth, id).await?;
    let bytes = documents::batch_label(&state.config.company_name, &batch, &product_name(recipe.as_ref()), now())
        .map_err(export_error_to_api)?;
    deliver(&state, &auth, &format!("label-{}.pdf", batch.lot_number), bytes, param.archive).await
}

/// `GET /api/documents/batches/{id}/work-order.pdf`
pub async fn work_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(param): Query<ArchiveParam>,
) -> Result<Response, ApiError> {
    auth.require(Permission::Read)?;
    let (batch, recipe) = load_batch(&state, &auth, id).await?;
    let Some(recipe) = recipe else {
        return Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "E_NO_RECIPE",
            format!("batch {} has no recipe", batch.lot_number),
        ));
    };

    let ids: Vec<Uuid> = recipe.ingredients.iter().map(|l| l.inventory_item_id).collect();
    let items: Vec<InventoryItem> = if ids.is_empty() {
        Vec::new()
    } else {
        entity::list_where(state.store(), &auth.token, &RemoteQuery::new().in_list("id", &ids))
            .await
            .map_err(entity_error_to_api)?
    };
    let by_id: HashMap<Uuid, InventoryItem> = items
        .into_iter()
        .filter_map(|item| item.id.map(|id| (id, item)))
        .collect();

    let bytes = documents::work_order(&state.config.company_name, &batch, &recipe, &by_id, now())
        .map_err(export_error_to_api)?;
    deliver(&state, &auth, &format!("work-order-{}.pdf", batch.lot_number), bytes, param.archive).await
}

/// `GET /api/documents/batches/{id}/coa.pdf`
pub async fn certificate_of_analysis(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(param): Query<ArchiveParam>,
) -> Result<Response, ApiError> {
    auth.require(Permission::Read)?;
    let (batch, recipe) = load_batch(&state, &auth, id).await?;
    let qc = quality::evaluate_batch(state.store(), &auth.token, id)
        .await
        .map_err(quality_error_to_api)?;
    let bytes = documents::certificate_of_analysis(
        &state.config.company_name,
        &batch,
        &product_name(recipe.as_ref()),
        &qc,
        now(),
    )
    .map_err(export_error_to_api)?;
    deliver(&state, &auth, &format!("coa-{}.pdf", batch.lot_number), bytes, param.archive).await
}

// =============================================================================
// FINANCIAL REPORT
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct FinancialPdfParams {
    #[serde(default)]
    pub from: Option<Date>,
    #[serde(default)]
    pub to: Option<Date>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub archive: bool,
}

/// `GET /api/documents/financial-report.pdf?from=&to=&currency=`
pub async fn financial_report(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<FinancialPdfParams>,
) -> Result<Response, ApiError> {
    auth.require(Permission::Read)?;
    let range = ReportRange { from: params.from, to: params.to, currency: params.currency };
    let report = build_financial(&state, &auth, &range).await?;
    let bytes = documents::financial_report(&state.config.company_name, &report, now())
        .map_err(export_error_to_api)?;
    deliver(&state, &auth, "financial-report.pdf", bytes, params.archive).await
}

#[cfg(test)]
#[path = "documents_test.rs"]
mod tests;
