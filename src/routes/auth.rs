//! Auth routes: password login against the remote store, session cookie,
//! and the authenticated-user extractor.

use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::Duration;
use uuid::Uuid;

use super::{api_error, remote_error_to_api};
use crate::error::ApiError;
use crate::model::Role;
use crate::remote::{RemoteError, RemoteUser};
use crate::services::roles::{self, Permission, RoleError};
use crate::state::AppState;

pub(crate) const COOKIE_NAME: &str = "session_token";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
}

fn session_cookie(value: String, secure: bool, max_age: Duration) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .build()
}

pub(crate) fn role_error_to_api(err: RoleError) -> ApiError {
    match &err {
        RoleError::Forbidden { .. } | RoleError::SelfRevoke | RoleError::SelfDemote(_) => {
            api_error(StatusCode::FORBIDDEN, &err)
        }
        RoleError::Remote(e) => api_error(super::remote_status(e), &err),
    }
}

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated user extracted from the session cookie, with their role.
/// Use as a handler parameter to require authentication.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: RemoteUser,
    pub role: Role,
    pub token: String,
}

impl AuthUser {
    /// # Errors
    ///
    /// Returns a 403 when the user's role lacks `needed`.
    pub fn require(&self, needed: Permission) -> Result<(), ApiError> {
        roles::require(self.role, needed).map_err(role_error_to_api)
    }
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(COOKIE_NAME).map(Cookie::value).unwrap_or_default();
        if token.is_empty() {
            return Err(ApiError::new(StatusCode::UNAUTHORIZED, "E_UNAUTHORIZED", "not signed in"));
        }

        let app_state = AppState::from_ref(state);
        let store = app_state.store();
        let user = store
            .current_user(token)
            .await
            .map_err(remote_error_to_api)?
            .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "E_UNAUTHORIZED", "session expired"))?;
        let role = roles::role_for(store, token, user.id)
            .await
            .map_err(role_error_to_api)?;

        Ok(Self { user, role, token: token.to_owned() })
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub email: Option<String>,
    pub role: Role,
}

/// `POST /api/auth/login`: exchange email/password for a session cookie.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginBody>,
) -> Result<(CookieJar, Json<MeResponse>), ApiError> {
    let email = body.email.trim();
    if email.is_empty() || body.password.is_empty() {
        return Err(ApiError::bad_request("email and password are required"));
    }
    let session = state.store().sign_in(email, &body.password).await.map_err(|e| match e {
        RemoteError::InvalidCredentials => ApiError::from_code(StatusCode::UNAUTHORIZED, &e),
        other => remote_error_to_api(other),
    })?;
    let role = roles::role_for(state.store(), &session.access_token, session.user.id)
        .await
        .map_err(role_error_to_api)?;

    let max_age = Duration::seconds(i64::try_from(session.expires_in).unwrap_or(i64::MAX).max(60));
    let cookie = session_cookie(session.access_token, state.config.cookie_secure, max_age);
    tracing::info!(user_id = %session.user.id, role = role.as_str(), "signed in");
    Ok((jar.add(cookie), Json(MeResponse { id: session.user.id, email: session.user.email, role })))
}

/// `GET /api/auth/me`: return the current user and role.
pub async fn me(auth: AuthUser) -> Json<MeResponse> {
    Json(MeResponse { id: auth.user.id, email: auth.user.email, role: auth.role })
}

/// `POST /api/auth/logout`: revoke the remote session, clear cookie.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    if let Err(e) = state.store().sign_out(&auth.token).await {
        tracing::warn!(error = %e, "remote sign-out failed");
    }
    let cookie = session_cookie(String::new(), state.config.cookie_secure, Duration::ZERO);
    (CookieJar::new().add(cookie), StatusCode::NO_CONTENT)
}

/// Signed-in user holding `role`, for handler tests.
#[cfg(test)]
pub(crate) fn test_auth(mock: &crate::state::test_helpers::MockRemote, email: &str, role: Role) -> AuthUser {
    let (token, id) = crate::state::test_helpers::seed_user(mock, email, Some(role));
    AuthUser { user: RemoteUser { id, email: Some(email.to_owned()) }, role, token }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
