//! reqwest implementation of [`RemoteStore`] for the hosted backend.
//!
//! Three API families share one HTTP client: `/rest/v1` for tables,
//! `/auth/v1` for password auth, `/storage/v1` for objects. Every request
//! carries the project `apikey` header plus a bearer token (the user's
//! access token, or the anon key for anonymous calls).

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::query::Query;
use super::types::{AuthSession, RemoteError, RemoteStore, RemoteUser};
use crate::config::RemoteConfig;

const RETURN_REPRESENTATION: &str = "return=representation";

pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    /// Build the client from typed config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| RemoteError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_owned(),
            anon_key: config.anon_key.clone(),
        })
    }

    pub(crate) fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    pub(crate) fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    pub(crate) fn object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{bucket}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) fn sign_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/sign/{bucket}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Turn the relative `signedURL` from the sign endpoint into an absolute URL.
    pub(crate) fn absolute_signed_url(&self, signed: &str) -> String {
        if signed.starts_with("http://") || signed.starts_with("https://") {
            return signed.to_owned();
        }
        format!("{}/storage/v1/{}", self.base_url, signed.trim_start_matches('/'))
    }

    fn authed(&self, req: RequestBuilder, token: &str) -> RequestBuilder {
        let bearer = if token.is_empty() { self.anon_key.as_str() } else { token };
        req.header("apikey", &self.anon_key).bearer_auth(bearer)
    }

    async fn send_rows(&self, req: RequestBuilder, table: &str) -> Result<Vec<Value>, RemoteError> {
        let resp = req
            .send()
            .await
            .map_err(|e| RemoteError::Request(e.to_string()))?;
        let resp = check_status(resp).await?;
        if resp.status() == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        let text = resp
            .text()
            .await
            .map_err(|e| RemoteError::Request(e.to_string()))?;
        parse_rows(&text).map_err(|e| RemoteError::Decode(format!("{table}: {e}")))
    }
}

/// Map non-success statuses onto [`RemoteError`] variants.
async fn check_status(resp: Response) -> Result<Response, RemoteError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(classify_status(status.as_u16(), body))
}

pub(crate) fn classify_status(status: u16, body: String) -> RemoteError {
    match status {
        401 | 403 => RemoteError::Unauthorized,
        409 => RemoteError::Conflict(body),
        _ => RemoteError::Response { status, body },
    }
}

/// Table endpoints answer with an array; a single object is tolerated.
pub(crate) fn parse_rows(text: &str) -> Result<Vec<Value>, serde_json::Error> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Value>(text)? {
        Value::Array(rows) => Ok(rows),
        Value::Null => Ok(Vec::new()),
        other => Ok(vec![other]),
    }
}

#[derive(Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL", alias = "signedUrl")]
    signed_url: String,
}

#[async_trait::async_trait]
impl RemoteStore for SupabaseClient {
    async fn select(&self, token: &str, table: &str, query: &Query) -> Result<Vec<Value>, RemoteError> {
        let req = self
            .authed(self.http.get(self.rest_url(table)), token)
            .query(&query.to_pairs());
        self.send_rows(req, table).await
    }

    async fn insert(&self, token: &str, table: &str, rows: Value) -> Result<Vec<Value>, RemoteError> {
        let req = self
            .authed(self.http.post(self.rest_url(table)), token)
            .header("Prefer", RETURN_REPRESENTATION)
            .query(&[("select", "*")])
            .json(&rows);
        self.send_rows(req, table).await
    }

    async fn update(&self, token: &str, table: &str, query: &Query, patch: Value) -> Result<Vec<Value>, RemoteError> {
        let req = self
            .authed(self.http.patch(self.rest_url(table)), token)
            .header("Prefer", RETURN_REPRESENTATION)
            .query(&query.filter_pairs())
            .json(&patch);
        self.send_rows(req, table).await
    }

    async fn delete(&self, token: &str, table: &str, query: &Query) -> Result<Vec<Value>, RemoteError> {
        let req = self
            .authed(self.http.delete(self.rest_url(table)), token)
            .header("Prefer", RETURN_REPRESENTATION)
            .query(&query.filter_pairs());
        self.send_rows(req, table).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, RemoteError> {
        let resp = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| RemoteError::Request(e.to_string()))?;

        if matches!(resp.status(), StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED) {
            return Err(RemoteError::InvalidCredentials);
        }
        let resp = check_status(resp).await?;
        resp.json::<AuthSession>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn current_user(&self, token: &str) -> Result<Option<RemoteUser>, RemoteError> {
        let resp = self
            .authed(self.http.get(self.auth_url("user")), token)
            .send()
            .await
            .map_err(|e| RemoteError::Request(e.to_string()))?;

        match check_status(resp).await {
            Ok(resp) => resp
                .json::<RemoteUser>()
                .await
                .map(Some)
                .map_err(|e| RemoteError::Decode(e.to_string())),
            Err(RemoteError::Unauthorized) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn sign_out(&self, token: &str) -> Result<(), RemoteError> {
        let resp = self
            .authed(self.http.post(self.auth_url("logout")), token)
            .send()
            .await
            .map_err(|e| RemoteError::Request(e.to_string()))?;
        check_status(resp).await?;
        Ok(())
    }

    async fn upload(
        &self,
        token: &str,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), RemoteError> {
        let resp = self
            .authed(self.http.post(self.object_url(bucket, path)), token)
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await
            .map_err(|e| RemoteError::Request(e.to_string()))?;
        check_status(resp).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn signed_url(
        &self,
        token: &str,
        bucket: &str,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<String, RemoteError> {
        let resp = self
            .authed(self.http.post(self.sign_url(bucket, path)), token)
            .json(&serde_json::json!({ "expiresIn": expires_in_secs }))
            .send()
            .await
            .map_err(|e| RemoteError::Request(e.to_string()))?;
        let resp = check_status(resp).await?;
        let body = resp
            .json::<SignedUrlResponse>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(self.absolute_signed_url(&body.signed_url))
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
