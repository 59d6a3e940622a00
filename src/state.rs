//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the remote store client and the parsed configuration. The
//! service keeps no data of its own; every request goes to the remote store.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::finance::ExchangeRates;
use crate::remote::RemoteStore;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub remote: Arc<dyn RemoteStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteStore>, config: AppConfig) -> Self {
        Self { remote, config: Arc::new(config) }
    }

    /// Remote store as a trait object reference, the form services take.
    #[must_use]
    pub fn store(&self) -> &dyn RemoteStore {
        self.remote.as_ref()
    }

    /// Configured fallback rates only, before the `exchange_rates` table is consulted.
    #[must_use]
    pub fn fallback_rates(&self) -> ExchangeRates {
        ExchangeRates::new(&self.config.fallback_rates)
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use std::collections::{BTreeMap, HashMap, HashSet};
    use std::sync::Mutex;

    use rust_decimal::Decimal;
    use serde_json::{Map, Value};
    use uuid::Uuid;

    use super::*;
    use crate::config::{RemoteConfig, RemoteTimeouts, StorageConfig};
    use crate::model::Role;
    use crate::remote::query::{Filter, Op};
    use crate::remote::{AuthSession, Query, RemoteError, RemoteUser};

    /// In-memory stand-in for the hosted backend.
    ///
    /// Tables are vectors of JSON objects. Filters compare the rendered
    /// string form of a column; `ilike` is a case-insensitive contains with
    /// `*` wildcards stripped. Inserted rows without an `id` get one.
    #[derive(Default)]
    pub struct MockRemote {
        tables: Mutex<HashMap<String, Vec<Value>>>,
        accounts: Mutex<HashMap<String, (String, RemoteUser)>>,
        sessions: Mutex<HashMap<String, RemoteUser>>,
        objects: Mutex<HashMap<String, (String, Vec<u8>)>>,
        failing: Mutex<HashSet<String>>,
    }

    impl MockRemote {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Replace a table's rows.
        pub fn seed(&self, table: &str, rows: Vec<Value>) {
            self.tables.lock().unwrap().insert(table.to_owned(), rows);
        }

        /// Current rows of a table.
        #[must_use]
        pub fn rows(&self, table: &str) -> Vec<Value> {
            self.tables.lock().unwrap().get(table).cloned().unwrap_or_default()
        }

        /// Make every mutation against `table` fail with a 500.
        pub fn fail_writes(&self, table: &str) {
            self.failing.lock().unwrap().insert(table.to_owned());
        }

        /// Register a password account and return its user.
        pub fn add_account(&self, email: &str, password: &str) -> RemoteUser {
            let user = RemoteUser { id: Uuid::new_v4(), email: Some(email.to_owned()) };
            self.accounts
                .lock()
                .unwrap()
                .insert(email.to_owned(), (password.to_owned(), user.clone()));
            user
        }

        /// Create a live session token for `user` without going through sign-in.
        pub fn issue_token(&self, user: &RemoteUser) -> String {
            let token = format!("token-{}", Uuid::new_v4());
            self.sessions.lock().unwrap().insert(token.clone(), user.clone());
            token
        }

        #[must_use]
        pub fn object(&self, bucket: &str, path: &str) -> Option<(String, Vec<u8>)> {
            self.objects.lock().unwrap().get(&format!("{bucket}/{path}")).cloned()
        }

        #[must_use]
        pub fn object_count(&self) -> usize {
            self.objects.lock().unwrap().len()
        }

        fn check_writable(&self, table: &str) -> Result<(), RemoteError> {
            if self.failing.lock().unwrap().contains(table) {
                return Err(RemoteError::Response { status: 500, body: format!("{table} unavailable") });
            }
            Ok(())
        }
    }

    fn rendered(value: Option<&Value>) -> String {
        match value {
            None | Some(Value::Null) => "null".to_owned(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    fn list_items(raw: &str) -> Vec<String> {
        raw.trim_start_matches('(')
            .trim_end_matches(')')
            .split(',')
            .map(|item| item.trim_matches('"').to_owned())
            .collect()
    }

    fn matches(row: &Value, filter: &Filter) -> bool {
        let actual = rendered(row.get(&filter.column));
        let expected = filter.value.as_str();
        match filter.op {
            Op::Eq => actual == expected,
            Op::Neq => actual != expected,
            Op::Gt => actual.as_str() > expected,
            Op::Gte => actual.as_str() >= expected,
            Op::Lt => actual.as_str() < expected,
            Op::Lte => actual.as_str() <= expected,
            Op::Ilike => actual.to_lowercase().contains(&expected.replace('*', "").to_lowercase()),
            Op::In => list_items(expected).contains(&actual),
        }
    }

    fn matches_all(row: &Value, query: &Query) -> bool {
        query.filters.iter().all(|f| matches(row, f))
    }

    fn with_id(mut row: Value) -> Value {
        if let Value::Object(map) = &mut row {
            if !map.contains_key("id") {
                map.insert("id".to_owned(), Value::String(Uuid::new_v4().to_string()));
            }
        }
        row
    }

    #[async_trait::async_trait]
    impl RemoteStore for MockRemote {
        async fn select(&self, _token: &str, table: &str, query: &Query) -> Result<Vec<Value>, RemoteError> {
            let mut rows: Vec<Value> = self
                .rows(table)
                .into_iter()
                .filter(|row| matches_all(row, query))
                .collect();
            for order in query.order.iter().rev() {
                rows.sort_by(|a, b| {
                    let ord = rendered(a.get(&order.column)).cmp(&rendered(b.get(&order.column)));
                    if order.ascending { ord } else { ord.reverse() }
                });
            }
            if let Some(limit) = query.limit {
                rows.truncate(limit);
            }
            Ok(rows)
        }

        async fn insert(&self, _token: &str, table: &str, rows: Value) -> Result<Vec<Value>, RemoteError> {
            self.check_writable(table)?;
            let new_rows: Vec<Value> = match rows {
                Value::Array(items) => items.into_iter().map(with_id).collect(),
                other => vec![with_id(other)],
            };
            self.tables
                .lock()
                .unwrap()
                .entry(table.to_owned())
                .or_default()
                .extend(new_rows.iter().cloned());
            Ok(new_rows)
        }

        async fn update(&self, _token: &str, table: &str, query: &Query, patch: Value) -> Result<Vec<Value>, RemoteError> {
            self.check_writable(table)?;
            let patch = match patch {
                Value::Object(map) => map,
                _ => Map::new(),
            };
            let mut tables = self.tables.lock().unwrap();
            let mut updated = Vec::new();
            for row in tables.entry(table.to_owned()).or_default().iter_mut() {
                if !matches_all(row, query) {
                    continue;
                }
                if let Value::Object(map) = row {
                    for (k, v) in &patch {
                        map.insert(k.clone(), v.clone());
                    }
                }
                updated.push(row.clone());
            }
            Ok(updated)
        }

        async fn delete(&self, _token: &str, table: &str, query: &Query) -> Result<Vec<Value>, RemoteError> {
            self.check_writable(table)?;
            let mut tables = self.tables.lock().unwrap();
            let rows = tables.entry(table.to_owned()).or_default();
            let (removed, kept): (Vec<Value>, Vec<Value>) = rows.drain(..).partition(|row| matches_all(row, query));
            *rows = kept;
            Ok(removed)
        }

        async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, RemoteError> {
            let account = self.accounts.lock().unwrap().get(email).cloned();
            match account {
                Some((expected, user)) if expected == password => Ok(AuthSession {
                    access_token: self.issue_token(&user),
                    refresh_token: "refresh".to_owned(),
                    expires_in: 3600,
                    user,
                }),
                _ => Err(RemoteError::InvalidCredentials),
            }
        }

        async fn current_user(&self, token: &str) -> Result<Option<RemoteUser>, RemoteError> {
            Ok(self.sessions.lock().unwrap().get(token).cloned())
        }

        async fn sign_out(&self, token: &str) -> Result<(), RemoteError> {
            self.sessions.lock().unwrap().remove(token);
            Ok(())
        }

        async fn upload(
            &self,
            _token: &str,
            bucket: &str,
            path: &str,
            content_type: &str,
            bytes: Vec<u8>,
        ) -> Result<(), RemoteError> {
            self.check_writable(bucket)?;
            self.objects
                .lock()
                .unwrap()
                .insert(format!("{bucket}/{path}"), (content_type.to_owned(), bytes));
            Ok(())
        }

        fn public_url(&self, bucket: &str, path: &str) -> String {
            format!("https://mock.test/storage/v1/object/public/{bucket}/{path}")
        }

        async fn signed_url(
            &self,
            _token: &str,
            bucket: &str,
            path: &str,
            expires_in_secs: u64,
        ) -> Result<String, RemoteError> {
            if !self.objects.lock().unwrap().contains_key(&format!("{bucket}/{path}")) {
                return Err(RemoteError::Response { status: 404, body: "object not found".to_owned() });
            }
            Ok(format!("https://mock.test/storage/v1/object/sign/{bucket}/{path}?expires={expires_in_secs}"))
        }
    }

    #[must_use]
    pub fn test_config() -> AppConfig {
        let mut fallback_rates = BTreeMap::new();
        fallback_rates.insert("USD".to_owned(), Decimal::ONE);
        fallback_rates.insert("TRY".to_owned(), Decimal::from(30));
        AppConfig {
            port: 0,
            remote: RemoteConfig {
                url: "https://mock.test".to_owned(),
                anon_key: "anon".to_owned(),
                timeouts: RemoteTimeouts { request_secs: 5, connect_secs: 5 },
            },
            storage: StorageConfig {
                image_bucket: "product-images".to_owned(),
                document_bucket: "documents".to_owned(),
                signed_url_ttl_secs: 600,
            },
            reporting_currency: "USD".to_owned(),
            fallback_rates,
            company_name: "Test Kimya".to_owned(),
            cookie_secure: false,
        }
    }

    /// App state over a fresh mock; the mock handle is returned for seeding.
    #[must_use]
    pub fn test_app_state() -> (AppState, Arc<MockRemote>) {
        let mock = Arc::new(MockRemote::new());
        (AppState::new(mock.clone(), test_config()), mock)
    }

    /// Register a signed-in user holding `role` and return their token.
    pub fn seed_user(mock: &MockRemote, email: &str, role: Option<Role>) -> (String, Uuid) {
        let user = mock.add_account(email, "secret");
        if let Some(role) = role {
            let mut rows = mock.rows("user_roles");
            rows.push(serde_json::json!({
                "id": Uuid::new_v4(),
                "user_id": user.id,
                "role": role.as_str(),
                "email": email,
            }));
            mock.seed("user_roles", rows);
        }
        (mock.issue_token(&user), user.id)
    }
}
