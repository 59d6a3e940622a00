//! Quality control: QC test records and the batch verdict.

use serde::Serialize;
use uuid::Uuid;

use crate::model::QualityTest;
use crate::remote::{self, Query, RemoteError, RemoteStore};

pub const TABLE: &str = "quality_tests";

#[derive(Debug, thiserror::Error)]
pub enum QualityError {
    #[error("parameter name is empty")]
    EmptyParameter,
    #[error("spec minimum {min} is above maximum {max}")]
    InvertedRange { min: rust_decimal::Decimal, max: rust_decimal::Decimal },
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl crate::error::ErrorCode for QualityError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyParameter => "E_QC_PARAMETER",
            Self::InvertedRange { .. } => "E_QC_RANGE",
            Self::Remote(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Remote(e) if e.retryable())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QcVerdict {
    Pass,
    Fail,
    /// No tests recorded yet.
    Pending,
}

impl QcVerdict {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Pending => "pending",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QcLine {
    #[serde(flatten)]
    pub test: QualityTest,
    pub passed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct QcReport {
    pub batch_id: Uuid,
    pub verdict: QcVerdict,
    pub tests: Vec<QcLine>,
}

#[must_use]
pub fn evaluate(tests: &[QualityTest]) -> QcVerdict {
    if tests.is_empty() {
        QcVerdict::Pending
    } else if tests.iter().all(QualityTest::passes) {
        QcVerdict::Pass
    } else {
        QcVerdict::Fail
    }
}

#[must_use]
pub fn report(batch_id: Uuid, tests: Vec<QualityTest>) -> QcReport {
    let verdict = evaluate(&tests);
    let tests = tests
        .into_iter()
        .map(|test| QcLine { passed: test.passes(), test })
        .collect();
    QcReport { batch_id, verdict, tests }
}

/// # Errors
///
/// Returns the remote error if the fetch fails.
pub async fn tests_for_batch(store: &dyn RemoteStore, token: &str, batch_id: Uuid) -> Result<Vec<QualityTest>, QualityError> {
    let query = Query::new().eq("batch_id", batch_id).order("parameter", true);
    Ok(remote::fetch(store, token, TABLE, &query).await?)
}

/// # Errors
///
/// Returns the remote error if the fetch fails.
pub async fn evaluate_batch(store: &dyn RemoteStore, token: &str, batch_id: Uuid) -> Result<QcReport, QualityError> {
    let tests = tests_for_batch(store, token, batch_id).await?;
    Ok(report(batch_id, tests))
}

/// # Errors
///
/// Returns `EmptyParameter` or `InvertedRange` before writing, or the remote error.
pub async fn record_test(store: &dyn RemoteStore, token: &str, test: &QualityTest) -> Result<QualityTest, QualityError> {
    if test.parameter.trim().is_empty() {
        return Err(QualityError::EmptyParameter);
    }
    if let (Some(min), Some(max)) = (test.spec_min, test.spec_max) {
        if min > max {
            return Err(QualityError::InvertedRange { min, max });
        }
    }
    let stored: QualityTest = remote::insert_one(store, token, TABLE, test).await?;
    tracing::info!(batch_id = %stored.batch_id, parameter = %stored.parameter, passed = stored.passes(), "qc test recorded");
    Ok(stored)
}

#[cfg(test)]
#[path = "quality_test.rs"]
mod tests;
