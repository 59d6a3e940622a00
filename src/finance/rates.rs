//! Currency conversion against a common base.
//!
//! Each rate is "units of that currency per one base unit", so converting
//! `amount` from `A` to `B` is `amount * rate[B] / rate[A]`.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::costing::CostingError;
use crate::model::{ExchangeRate, normalize_currency};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExchangeRates {
    rates: BTreeMap<String, Decimal>,
}

impl ExchangeRates {
    #[must_use]
    pub fn new(rates: &BTreeMap<String, Decimal>) -> Self {
        let rates = rates
            .iter()
            .filter(|(_, rate)| **rate > Decimal::ZERO)
            .map(|(code, rate)| (normalize_currency(code), *rate))
            .collect();
        Self { rates }
    }

    /// Rates from the `exchange_rates` table layered over the configured fallback.
    /// Non-positive rows are ignored.
    #[must_use]
    pub fn from_rows(rows: &[ExchangeRate], fallback: &BTreeMap<String, Decimal>) -> Self {
        let mut merged = Self::new(fallback);
        for row in rows {
            if row.rate <= Decimal::ZERO {
                tracing::warn!(currency = %row.currency, rate = %row.rate, "ignoring non-positive exchange rate");
                continue;
            }
            merged.rates.insert(normalize_currency(&row.currency), row.rate);
        }
        merged
    }

    /// Rate for `code`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownCurrency` when no rate is known.
    pub fn rate(&self, code: &str) -> Result<Decimal, CostingError> {
        let code = normalize_currency(code);
        self.rates
            .get(&code)
            .copied()
            .ok_or(CostingError::UnknownCurrency(code))
    }

    /// Convert `amount` from one currency to another.
    ///
    /// # Errors
    ///
    /// Returns `UnknownCurrency` for a missing rate, or `Overflow`.
    pub fn convert(&self, amount: Decimal, from: &str, to: &str) -> Result<Decimal, CostingError> {
        if normalize_currency(from) == normalize_currency(to) {
            return Ok(amount);
        }
        let from_rate = self.rate(from)?;
        let to_rate = self.rate(to)?;
        amount
            .checked_mul(to_rate)
            .and_then(|scaled| scaled.checked_div(from_rate))
            .ok_or(CostingError::Overflow)
    }

    #[must_use]
    pub fn currencies(&self) -> Vec<&str> {
        self.rates.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
#[path = "rates_test.rs"]
mod tests;
