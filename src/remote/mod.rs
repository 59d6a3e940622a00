//! Remote store: the single data client for the hosted backend.
//!
//! DESIGN
//! ======
//! All persistence, auth, and file storage is delegated to the hosted
//! backend. Services talk to it through the [`RemoteStore`] trait so tests
//! can substitute an in-memory store; [`SupabaseClient`] is the production
//! implementation. The typed helpers below decode rows into model structs.
//!
//! There is no retry policy: a failed call is returned to the caller as-is.

pub mod client;
pub mod query;
pub mod types;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use client::SupabaseClient;
pub use query::Query;
pub use types::{AuthSession, RemoteError, RemoteStore, RemoteUser};

fn decode<T: DeserializeOwned>(table: &str, value: Value) -> Result<T, RemoteError> {
    serde_json::from_value(value).map_err(|e| RemoteError::Decode(format!("{table}: {e}")))
}

fn encode<T: Serialize>(table: &str, value: &T) -> Result<Value, RemoteError> {
    serde_json::to_value(value).map_err(|e| RemoteError::Decode(format!("{table}: {e}")))
}

/// Fetch and decode every row matching `query`.
///
/// # Errors
///
/// Returns the remote error, or `Decode` if a row does not match `T`.
pub async fn fetch<T: DeserializeOwned>(
    store: &dyn RemoteStore,
    token: &str,
    table: &str,
    query: &Query,
) -> Result<Vec<T>, RemoteError> {
    let rows = store.select(token, table, query).await?;
    tracing::debug!(table, rows = rows.len(), "remote select");
    rows.into_iter().map(|row| decode(table, row)).collect()
}

/// Fetch the first row matching `query`.
///
/// # Errors
///
/// Returns the remote error, or `Decode` if the row does not match `T`.
pub async fn fetch_one<T: DeserializeOwned>(
    store: &dyn RemoteStore,
    token: &str,
    table: &str,
    query: Query,
) -> Result<Option<T>, RemoteError> {
    let rows = store.select(token, table, &query.limit(1)).await?;
    rows.into_iter()
        .next()
        .map(|row| decode(table, row))
        .transpose()
}

/// Insert one row and return the stored representation.
///
/// # Errors
///
/// Returns the remote error, or `Decode` if the store echoes no row.
pub async fn insert_one<T: Serialize, R: DeserializeOwned>(
    store: &dyn RemoteStore,
    token: &str,
    table: &str,
    row: &T,
) -> Result<R, RemoteError> {
    let rows = store.insert(token, table, encode(table, row)?).await?;
    let Some(first) = rows.into_iter().next() else {
        return Err(RemoteError::Decode(format!("{table}: insert returned no rows")));
    };
    decode(table, first)
}

/// Insert many rows in one request.
///
/// # Errors
///
/// Returns the remote error, or `Decode` if a stored row does not match `R`.
pub async fn insert_many<T: Serialize, R: DeserializeOwned>(
    store: &dyn RemoteStore,
    token: &str,
    table: &str,
    rows: &[T],
) -> Result<Vec<R>, RemoteError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let stored = store.insert(token, table, encode(table, &rows)?).await?;
    stored.into_iter().map(|row| decode(table, row)).collect()
}

/// Patch rows matching `query` and return them decoded.
///
/// # Errors
///
/// Returns the remote error, or `Decode` if a row does not match `R`.
pub async fn update_where<T: Serialize, R: DeserializeOwned>(
    store: &dyn RemoteStore,
    token: &str,
    table: &str,
    query: &Query,
    patch: &T,
) -> Result<Vec<R>, RemoteError> {
    let rows = store.update(token, table, query, encode(table, patch)?).await?;
    rows.into_iter().map(|row| decode(table, row)).collect()
}
