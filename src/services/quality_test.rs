use rust_decimal::Decimal;

use super::*;
use crate::state::test_helpers::MockRemote;

fn qc(batch_id: Uuid, parameter: &str, min: Option<i64>, max: Option<i64>, value: i64) -> QualityTest {
    QualityTest {
        id: None,
        batch_id,
        parameter: parameter.into(),
        spec_min: min.map(Decimal::from),
        spec_max: max.map(Decimal::from),
        measured_value: Decimal::from(value),
        unit: None,
        notes: None,
    }
}

#[test]
fn no_tests_is_pending() {
    assert_eq!(evaluate(&[]), QcVerdict::Pending);
}

#[test]
fn all_in_range_passes_and_bounds_are_inclusive() {
    let b = Uuid::new_v4();
    let tests = vec![qc(b, "pH", Some(6), Some(8), 8), qc(b, "density", Some(1), None, 1), qc(b, "viscosity", None, Some(50), 12)];
    assert_eq!(evaluate(&tests), QcVerdict::Pass);
}

#[test]
fn any_out_of_range_fails() {
    let b = Uuid::new_v4();
    let tests = vec![qc(b, "pH", Some(6), Some(8), 7), qc(b, "density", Some(1), Some(2), 3)];
    assert_eq!(evaluate(&tests), QcVerdict::Fail);
    let r = report(b, tests);
    assert_eq!(r.verdict, QcVerdict::Fail);
    assert!(r.tests[0].passed);
    assert!(!r.tests[1].passed);
}

#[tokio::test]
async fn record_then_evaluate_batch() {
    let mock = MockRemote::new();
    let b = Uuid::new_v4();
    record_test(&mock, "t", &qc(b, "pH", Some(6), Some(8), 7)).await.unwrap();
    record_test(&mock, "t", &qc(Uuid::new_v4(), "pH", Some(6), Some(8), 2)).await.unwrap();
    let r = evaluate_batch(&mock, "t", b).await.unwrap();
    assert_eq!(r.verdict, QcVerdict::Pass);
    assert_eq!(r.tests.len(), 1);
}

#[tokio::test]
async fn record_rejects_inverted_range_and_blank_parameter() {
    let mock = MockRemote::new();
    let b = Uuid::new_v4();
    assert!(matches!(
        record_test(&mock, "t", &qc(b, "pH", Some(9), Some(8), 7)).await,
        Err(QualityError::InvertedRange { .. })
    ));
    assert!(matches!(record_test(&mock, "t", &qc(b, " ", None, None, 7)).await, Err(QualityError::EmptyParameter)));
    assert!(mock.rows(TABLE).is_empty());
}
