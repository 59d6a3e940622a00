//! Service configuration parsed from environment variables.
//!
//! Values may come from a `.env` file (loaded by `main` via `dotenvy`) or
//! from the process environment. Only the remote store URL and anon key are
//! required; everything else has a default.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_REMOTE_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_REMOTE_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_STORAGE_BUCKET: &str = "product-images";
pub const DEFAULT_DOCUMENT_BUCKET: &str = "documents";
pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 3600;
pub const DEFAULT_REPORTING_CURRENCY: &str = "TRY";
pub const DEFAULT_EXCHANGE_RATES: &str = "USD=1,EUR=0.92,TRY=32.5";
pub const DEFAULT_COMPANY_NAME: &str = "Back Office";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl crate::error::ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Missing(_) => "E_CONFIG_MISSING",
            Self::Invalid { .. } => "E_CONFIG_INVALID",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Base project URL without a trailing slash.
    pub url: String,
    pub anon_key: String,
    pub timeouts: RemoteTimeouts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub image_bucket: String,
    pub document_bucket: String,
    pub signed_url_ttl_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub port: u16,
    pub remote: RemoteConfig,
    pub storage: StorageConfig,
    pub reporting_currency: String,
    /// Rates against a common base, used when the `exchange_rates` table is empty.
    pub fallback_rates: BTreeMap<String, Decimal>,
    pub company_name: String,
    pub cookie_secure: bool,
}

impl AppConfig {
    /// Build typed config from environment variables.
    ///
    /// Required:
    /// - `SUPABASE_URL`
    /// - `SUPABASE_ANON_KEY`
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `REMOTE_REQUEST_TIMEOUT_SECS` / `REMOTE_CONNECT_TIMEOUT_SECS`: default 30 / 10
    /// - `STORAGE_BUCKET` / `DOCUMENT_BUCKET`: default `product-images` / `documents`
    /// - `SIGNED_URL_TTL_SECS`: default 3600
    /// - `REPORTING_CURRENCY`: default `TRY`
    /// - `EXCHANGE_RATES`: `CODE=rate` pairs separated by commas
    /// - `COMPANY_NAME`: printed on document headers
    /// - `COOKIE_SECURE`: boolean, default false
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = std::env::var("SUPABASE_URL").map_err(|_| ConfigError::Missing("SUPABASE_URL"))?;
        let url = url.trim().trim_end_matches('/').to_string();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Invalid { var: "SUPABASE_URL", reason: format!("not an http(s) url: {url}") });
        }
        let anon_key = std::env::var("SUPABASE_ANON_KEY").map_err(|_| ConfigError::Missing("SUPABASE_ANON_KEY"))?;

        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|e| ConfigError::Invalid { var: "PORT", reason: e.to_string() })?,
            Err(_) => DEFAULT_PORT,
        };

        let timeouts = RemoteTimeouts {
            request_secs: env_parse_u64("REMOTE_REQUEST_TIMEOUT_SECS", DEFAULT_REMOTE_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("REMOTE_CONNECT_TIMEOUT_SECS", DEFAULT_REMOTE_CONNECT_TIMEOUT_SECS),
        };

        let storage = StorageConfig {
            image_bucket: env_or("STORAGE_BUCKET", DEFAULT_STORAGE_BUCKET),
            document_bucket: env_or("DOCUMENT_BUCKET", DEFAULT_DOCUMENT_BUCKET),
            signed_url_ttl_secs: env_parse_u64("SIGNED_URL_TTL_SECS", DEFAULT_SIGNED_URL_TTL_SECS),
        };

        let reporting_currency = env_or("REPORTING_CURRENCY", DEFAULT_REPORTING_CURRENCY).to_ascii_uppercase();
        let fallback_rates = parse_rates(&env_or("EXCHANGE_RATES", DEFAULT_EXCHANGE_RATES))?;

        Ok(Self {
            port,
            remote: RemoteConfig { url, anon_key, timeouts },
            storage,
            reporting_currency,
            fallback_rates,
            company_name: env_or("COMPANY_NAME", DEFAULT_COMPANY_NAME),
            cookie_secure: env_bool("COOKIE_SECURE").unwrap_or(false),
        })
    }
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

/// Parse `USD=1,EUR=0.92` into a rate table keyed by upper-case code.
pub(crate) fn parse_rates(raw: &str) -> Result<BTreeMap<String, Decimal>, ConfigError> {
    let mut rates = BTreeMap::new();
    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((code, rate)) = pair.split_once('=') else {
            return Err(ConfigError::Invalid { var: "EXCHANGE_RATES", reason: format!("expected CODE=rate, got {pair}") });
        };
        let rate = rate
            .trim()
            .parse::<Decimal>()
            .map_err(|e| ConfigError::Invalid { var: "EXCHANGE_RATES", reason: format!("{pair}: {e}") })?;
        if rate <= Decimal::ZERO {
            return Err(ConfigError::Invalid { var: "EXCHANGE_RATES", reason: format!("{pair}: rate must be positive") });
        }
        rates.insert(code.trim().to_ascii_uppercase(), rate);
    }
    Ok(rates)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
