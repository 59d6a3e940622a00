//! Remote store types: errors, auth session, and the store trait.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::query::Query;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by remote store operations.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("remote request failed: {0}")]
    Request(String),

    /// The remote store rejected the caller's token.
    #[error("remote store rejected credentials")]
    Unauthorized,

    /// Email/password sign-in was refused.
    #[error("invalid login credentials")]
    InvalidCredentials,

    /// A uniqueness or foreign-key constraint failed remotely.
    #[error("remote conflict: {0}")]
    Conflict(String),

    /// Any other non-success status.
    #[error("remote response error: status {status}")]
    Response { status: u16, body: String },

    /// The response body did not match the expected shape.
    #[error("remote response decode failed: {0}")]
    Decode(String),
}

impl crate::error::ErrorCode for RemoteError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::Request(_) => "E_REMOTE_REQUEST",
            Self::Unauthorized => "E_UNAUTHORIZED",
            Self::InvalidCredentials => "E_INVALID_CREDENTIALS",
            Self::Conflict(_) => "E_CONFLICT",
            Self::Response { .. } => "E_REMOTE_RESPONSE",
            Self::Decode(_) => "E_REMOTE_DECODE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Response { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// AUTH
// =============================================================================

/// Authenticated user as reported by the remote auth endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Token pair returned by a password sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: u64,
    pub user: RemoteUser,
}

// =============================================================================
// STORE TRAIT
// =============================================================================

/// Everything this service asks of the hosted backend: table CRUD,
/// password auth, and object storage. Enables mocking in tests.
///
/// `token` is the signed-in user's access token; the anon key is used when
/// it is empty.
#[async_trait::async_trait]
pub trait RemoteStore: Send + Sync {
    /// Rows matching `query`.
    async fn select(&self, token: &str, table: &str, query: &Query) -> Result<Vec<Value>, RemoteError>;

    /// Insert one object or an array of objects; returns the stored rows.
    async fn insert(&self, token: &str, table: &str, rows: Value) -> Result<Vec<Value>, RemoteError>;

    /// Patch rows matching the filters of `query`; returns the updated rows.
    async fn update(&self, token: &str, table: &str, query: &Query, patch: Value) -> Result<Vec<Value>, RemoteError>;

    /// Delete rows matching the filters of `query`; returns the deleted rows.
    async fn delete(&self, token: &str, table: &str, query: &Query) -> Result<Vec<Value>, RemoteError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, RemoteError>;

    /// `None` when the token is expired or unknown.
    async fn current_user(&self, token: &str) -> Result<Option<RemoteUser>, RemoteError>;

    async fn sign_out(&self, token: &str) -> Result<(), RemoteError>;

    async fn upload(
        &self,
        token: &str,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), RemoteError>;

    fn public_url(&self, bucket: &str, path: &str) -> String;

    async fn signed_url(&self, token: &str, bucket: &str, path: &str, expires_in_secs: u64)
    -> Result<String, RemoteError>;
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
