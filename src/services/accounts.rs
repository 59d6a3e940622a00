//! Current accounts: supplier/customer ledgers with a running balance.
//!
//! Balances are derived on read from `account_transactions`; nothing is
//! stored on the account row.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::entity::{self, EntityError};
use crate::finance::report::account_balance;
use crate::model::{Account, AccountTransaction};
use crate::remote::{self, Query, RemoteError, RemoteStore};

pub const TRANSACTIONS_TABLE: &str = "account_transactions";

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("transaction amount must be positive")]
    NonPositiveAmount,
    #[error(transparent)]
    Entity(#[from] EntityError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl crate::error::ErrorCode for AccountError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveAmount => "E_NON_POSITIVE_AMOUNT",
            Self::Entity(e) => e.error_code(),
            Self::Remote(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::NonPositiveAmount => false,
            Self::Entity(e) => e.retryable(),
            Self::Remote(e) => e.retryable(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    #[serde(flatten)]
    pub account: Account,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct Statement {
    #[serde(flatten)]
    pub summary: AccountSummary,
    pub transactions: Vec<AccountTransaction>,
}

/// Every account with its balance.
///
/// # Errors
///
/// Returns the remote error if either fetch fails.
pub async fn list_with_balances(store: &dyn RemoteStore, token: &str) -> Result<Vec<AccountSummary>, AccountError> {
    let accounts: Vec<Account> = entity::list(store, token).await?;
    let transactions: Vec<AccountTransaction> = remote::fetch(store, token, TRANSACTIONS_TABLE, &Query::new()).await?;
    let mut grouped: HashMap<Uuid, Vec<AccountTransaction>> = HashMap::new();
    for tx in transactions {
        grouped.entry(tx.account_id).or_default().push(tx);
    }
    Ok(accounts
        .into_iter()
        .map(|account| {
            let balance = account
                .id
                .and_then(|id| grouped.get(&id))
                .map_or(Decimal::ZERO, |txs| account_balance(txs));
            AccountSummary { account, balance }
        })
        .collect())
}

/// One account with its balance and transactions, newest first.
///
/// # Errors
///
/// Returns `NotFound` or the remote error.
pub async fn statement(store: &dyn RemoteStore, token: &str, id: Uuid) -> Result<Statement, AccountError> {
    let account: Account = entity::get(store, token, id).await?;
    let query = Query::new().eq("account_id", id).order("transaction_date", false);
    let transactions: Vec<AccountTransaction> = remote::fetch(store, token, TRANSACTIONS_TABLE, &query).await?;
    let balance = account_balance(&transactions);
    Ok(Statement { summary: AccountSummary { account, balance }, transactions })
}

/// Record a debit or credit against an existing account.
///
/// # Errors
///
/// Returns `NonPositiveAmount`, `NotFound` for an unknown account, or the remote error.
pub async fn post_transaction(
    store: &dyn RemoteStore,
    token: &str,
    tx: &AccountTransaction,
) -> Result<AccountTransaction, AccountError> {
    if tx.amount <= Decimal::ZERO {
        return Err(AccountError::NonPositiveAmount);
    }
    let _: Account = entity::get(store, token, tx.account_id).await?;
    let stored: AccountTransaction = remote::insert_one(store, token, TRANSACTIONS_TABLE, tx).await?;
    tracing::info!(account_id = %stored.account_id, kind = ?stored.kind, amount = %stored.amount, "transaction posted");
    Ok(stored)
}

#[cfg(test)]
#[path = "accounts_test.rs"]
mod tests;
