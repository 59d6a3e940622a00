//! Record shapes consumed from the remote tables.
//!
//! The remote store owns the schema; these structs mirror the columns this
//! service reads and writes. Server-assigned columns (`id`, timestamps) are
//! optional and skipped on serialization when absent so the same struct
//! can be sent as an insert body.

pub mod erp;
pub mod store;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

pub use erp::*;
pub use store::*;

/// Remote numeric columns may be `null`; treat that as zero.
pub(crate) fn null_as_zero<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Decimal>::deserialize(deserializer)?.unwrap_or_default())
}

/// Currency codes are compared upper-case everywhere.
#[must_use]
pub fn normalize_currency(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
