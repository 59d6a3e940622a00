//! Multipart upload routes for product images and loose files.

use axum::Router;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::post;
use uuid::Uuid;

use super::auth::AuthUser;
use super::{api_error, entity_status, remote_status};
use crate::error::ApiError;
use crate::model::Product;
use crate::services::roles::Permission;
use crate::services::uploads::{self, StoredObject, UploadError, UploadFile};
use crate::state::AppState;

/// Object prefix for files uploaded outside a product.
const LOOSE_PREFIX: &str = "uploads";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/products/{id}/images", post(product_images))
        .route("/api/uploads", post(upload_files))
}

pub(crate) fn upload_error_to_api(err: UploadError) -> ApiError {
    let status = match &err {
        UploadError::NoFiles | UploadError::EmptyFile(_) => StatusCode::BAD_REQUEST,
        UploadError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        UploadError::UnsupportedType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        UploadError::Entity(e) => entity_status(e),
        UploadError::Remote(e) => remote_status(e),
    };
    api_error(status, &err)
}

fn multipart_error(err: MultipartError) -> ApiError {
    tracing::warn!(error = %err, "malformed multipart body");
    ApiError::new(err.status(), "E_MULTIPART", err.body_text())
}

/// Every file part of the body. Parts without a file name are form fields
/// and are skipped.
async fn read_files(mut multipart: Multipart) -> Result<Vec<UploadFile>, ApiError> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(file_name) = field.file_name().map(str::to_owned) else {
            continue;
        };
        let content_type = field.content_type().unwrap_or("application/octet-stream").to_owned();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        files.push(UploadFile { file_name, content_type, bytes: bytes.to_vec() });
    }
    Ok(files)
}

/// `POST /api/products/{id}/images`: append images to a product's gallery.
pub async fn product_images(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<Product>, ApiError> {
    auth.require(Permission::Write)?;
    let files = read_files(multipart).await?;
    let product = uploads::attach_product_images(state.store(), &auth.token, &state.config.storage.image_bucket, id, files)
        .await
        .map_err(upload_error_to_api)?;
    Ok(Json(product))
}

/// `POST /api/uploads`: store any files and return their public URLs.
pub async fn upload_files(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<StoredObject>>), ApiError> {
    auth.require(Permission::Write)?;
    let files = read_files(multipart).await?;
    let stored = uploads::upload_all(
        state.store(),
        &auth.token,
        &state.config.storage.image_bucket,
        LOOSE_PREFIX,
        files,
        false,
    )
    .await
    .map_err(upload_error_to_api)?;
    Ok((StatusCode::CREATED, Json(stored)))
}

#[cfg(test)]
#[path = "uploads_test.rs"]
mod tests;
