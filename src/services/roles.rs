//! Role management and permission checks.
//!
//! Roles live in `user_roles`, one row per user. A user without a row is a
//! viewer. Viewers read; editors also write business records; admins also
//! manage settings and roles.
//!
//! An admin cannot revoke or lower their own role, so at least the acting
//! admin keeps access to role management.

use serde::Serialize;
use uuid::Uuid;

use crate::model::{Role, UserRole};
use crate::remote::{self, Query, RemoteError, RemoteStore};

pub const TABLE: &str = "user_roles";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
    Administer,
}

#[derive(Debug, thiserror::Error)]
pub enum RoleError {
    #[error("role {role} may not {needed:?}")]
    Forbidden { role: &'static str, needed: Permission },
    #[error("admins cannot revoke their own role")]
    SelfRevoke,
    #[error("admins cannot demote themselves to {0}")]
    SelfDemote(&'static str),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl crate::error::ErrorCode for RoleError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Forbidden { .. } => "E_FORBIDDEN",
            Self::SelfRevoke => "E_SELF_REVOKE",
            Self::SelfDemote(_) => "E_SELF_DEMOTE",
            Self::Remote(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Remote(e) if e.retryable())
    }
}

#[must_use]
pub fn allows(role: Role, needed: Permission) -> bool {
    match needed {
        Permission::Read => true,
        Permission::Write => role >= Role::Editor,
        Permission::Administer => role == Role::Admin,
    }
}

/// # Errors
///
/// Returns `Forbidden` when `role` lacks `needed`.
pub fn require(role: Role, needed: Permission) -> Result<(), RoleError> {
    if allows(role, needed) {
        Ok(())
    } else {
        Err(RoleError::Forbidden { role: role.as_str(), needed })
    }
}

/// The user's role, or `Viewer` when no row exists.
///
/// # Errors
///
/// Returns the remote error if the lookup fails.
pub async fn role_for(store: &dyn RemoteStore, token: &str, user_id: Uuid) -> Result<Role, RoleError> {
    let row: Option<UserRole> = remote::fetch_one(store, token, TABLE, Query::new().eq("user_id", user_id)).await?;
    Ok(row.map_or(Role::Viewer, |r| r.role))
}

/// # Errors
///
/// Returns the remote error if the fetch fails.
pub async fn list(store: &dyn RemoteStore, token: &str) -> Result<Vec<UserRole>, RoleError> {
    Ok(remote::fetch(store, token, TABLE, &Query::new().order("email", true)).await?)
}

/// Give `user_id` a role, replacing any existing one.
///
/// # Errors
///
/// Returns `SelfDemote` when `acting_user` gives themselves a role below
/// admin, or the remote error.
pub async fn assign(
    store: &dyn RemoteStore,
    token: &str,
    acting_user: Uuid,
    user_id: Uuid,
    role: Role,
    email: Option<String>,
) -> Result<UserRole, RoleError> {
    if acting_user == user_id && role != Role::Admin {
        return Err(RoleError::SelfDemote(role.as_str()));
    }
    let row = UserRole { id: None, user_id, role, email };
    let query = Query::new().eq("user_id", user_id);
    let updated: Vec<UserRole> = remote::update_where(store, token, TABLE, &query, &row).await?;
    let stored = match updated.into_iter().next() {
        Some(existing) => existing,
        None => remote::insert_one(store, token, TABLE, &row).await?,
    };
    tracing::info!(%user_id, role = role.as_str(), "role assigned");
    Ok(stored)
}

/// Remove a user's role row; they fall back to viewer.
///
/// # Errors
///
/// Returns `SelfRevoke` when `acting_user` targets themselves, or the remote error.
pub async fn revoke(store: &dyn RemoteStore, token: &str, acting_user: Uuid, user_id: Uuid) -> Result<(), RoleError> {
    if acting_user == user_id {
        return Err(RoleError::SelfRevoke);
    }
    store.delete(token, TABLE, &Query::new().eq("user_id", user_id)).await?;
    tracing::info!(%user_id, "role revoked");
    Ok(())
}

#[cfg(test)]
#[path = "roles_test.rs"]
mod tests;
