//! File uploads to object storage.
//!
//! DESIGN
//! ======
//! Objects are stored under a content-addressed name:
//! `{prefix}/{sha256[..16]}-{sanitized file name}`, so re-uploading the same
//! file overwrites instead of duplicating. Several files are uploaded as one
//! parallel join with no concurrency cap; the first failure fails the batch,
//! and objects already written stay in the bucket.

use std::fmt::Write;

use futures::future::try_join_all;
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::entity::{self, Entity, EntityError};
use crate::model::Product;
use crate::remote::{self, Query, RemoteError, RemoteStore};

/// Largest accepted upload, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("no files in upload")]
    NoFiles,
    #[error("{0} is empty")]
    EmptyFile(String),
    #[error("{name} is {size} bytes, limit is {}", MAX_UPLOAD_BYTES)]
    TooLarge { name: String, size: usize },
    #[error("{name} has unsupported type {content_type}")]
    UnsupportedType { name: String, content_type: String },
    #[error(transparent)]
    Entity(#[from] EntityError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl crate::error::ErrorCode for UploadError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NoFiles => "E_UPLOAD_EMPTY",
            Self::EmptyFile(_) => "E_UPLOAD_EMPTY_FILE",
            Self::TooLarge { .. } => "E_UPLOAD_TOO_LARGE",
            Self::UnsupportedType { .. } => "E_UPLOAD_TYPE",
            Self::Entity(e) => e.error_code(),
            Self::Remote(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Entity(e) => e.retryable(),
            Self::Remote(e) => e.retryable(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    pub bucket: String,
    pub path: String,
    pub url: String,
}

/// File name reduced to `[a-z0-9._-]`, never empty.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let trimmed = cleaned.trim_matches(|c| c == '-' || c == '.');
    if trimmed.is_empty() { "file".to_owned() } else { trimmed.to_owned() }
}

#[must_use]
pub fn object_path(prefix: &str, file_name: &str, bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut hex = String::with_capacity(16);
    for byte in digest.iter().take(8) {
        let _ = write!(hex, "{byte:02x}");
    }
    let prefix = prefix.trim_matches('/');
    let name = sanitize_file_name(file_name);
    if prefix.is_empty() { format!("{hex}-{name}") } else { format!("{prefix}/{hex}-{name}") }
}

fn check(file: &UploadFile, images_only: bool) -> Result<(), UploadError> {
    if file.bytes.is_empty() {
        return Err(UploadError::EmptyFile(file.file_name.clone()));
    }
    if file.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge { name: file.file_name.clone(), size: file.bytes.len() });
    }
    if images_only && !IMAGE_TYPES.contains(&file.content_type.as_str()) {
        return Err(UploadError::UnsupportedType { name: file.file_name.clone(), content_type: file.content_type.clone() });
    }
    Ok(())
}

/// Upload every file in parallel and return their public URLs.
///
/// # Errors
///
/// Returns a validation error before any upload starts, or the first remote error.
pub async fn upload_all(
    store: &dyn RemoteStore,
    token: &str,
    bucket: &str,
    prefix: &str,
    files: Vec<UploadFile>,
    images_only: bool,
) -> Result<Vec<StoredObject>, UploadError> {
    if files.is_empty() {
        return Err(UploadError::NoFiles);
    }
    for file in &files {
        check(file, images_only)?;
    }
    let uploads = files.into_iter().map(|file| async move {
        let path = object_path(prefix, &file.file_name, &file.bytes);
        store.upload(token, bucket, &path, &file.content_type, file.bytes).await?;
        let url = store.public_url(bucket, &path);
        Ok::<_, UploadError>(StoredObject { bucket: bucket.to_owned(), path, url })
    });
    let stored = try_join_all(uploads).await?;
    tracing::info!(bucket, count = stored.len(), "files uploaded");
    Ok(stored)
}

/// Upload images and append their URLs to a product's gallery.
///
/// # Errors
///
/// Returns `NotFound` for an unknown product, a validation error, or the remote error.
pub async fn attach_product_images(
    store: &dyn RemoteStore,
    token: &str,
    bucket: &str,
    product_id: Uuid,
    files: Vec<UploadFile>,
) -> Result<Product, UploadError> {
    let mut product: Product = entity::get(store, token, product_id).await?;
    let stored = upload_all(store, token, bucket, &format!("products/{product_id}"), files, true).await?;
    for object in stored {
        if !product.images.contains(&object.url) {
            product.images.push(object.url);
        }
    }
    let patch = serde_json::json!({ "images": product.images });
    let query = Query::new().eq("id", product_id);
    let updated: Vec<Product> = remote::update_where(store, token, Product::TABLE, &query, &patch).await?;
    Ok(updated.into_iter().next().unwrap_or(product))
}

/// Store a generated document privately and return a time-limited link.
///
/// # Errors
///
/// Returns the remote error if the upload or signing fails.
pub async fn archive_document(
    store: &dyn RemoteStore,
    token: &str,
    bucket: &str,
    file_name: &str,
    bytes: Vec<u8>,
    ttl_secs: u64,
) -> Result<StoredObject, UploadError> {
    let path = object_path("documents", file_name, &bytes);
    store.upload(token, bucket, &path, "application/pdf", bytes).await?;
    let url = store.signed_url(token, bucket, &path, ttl_secs).await?;
    tracing::info!(bucket, %path, "document archived");
    Ok(StoredObject { bucket: bucket.to_owned(), path, url })
}

#[cfg(test)]
#[path = "uploads_test.rs"]
mod tests;
