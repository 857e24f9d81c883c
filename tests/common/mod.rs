//! Shared test utilities and fixture generators

use polars::prelude::*;

/// Install a test-writer tracing subscriber (RUST_LOG controls the level)
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Build an applicant table from per-group pass/fail counts.
///
/// Columns:
/// - `group`: group label
/// - `score`: 1.0 for passing records, 0.0 for failing ones (cutscore 0.5)
/// - `decision`: "hired" or "rejected", mirroring `score`
pub fn create_counts_dataframe(groups: &[(&str, usize, usize)]) -> DataFrame {
    let mut labels = Vec::new();
    let mut scores = Vec::new();
    let mut decisions = Vec::new();

    for (group, passed, failed) in groups {
        for i in 0..(passed + failed) {
            let pass = i < *passed;
            labels.push(group.to_string());
            scores.push(if pass { 1.0 } else { 0.0 });
            decisions.push(if pass { "hired" } else { "rejected" });
        }
    }

    df! {
        "group" => labels,
        "score" => scores,
        "decision" => decisions,
    }
    .unwrap()
}

/// Scenario A: scores [10, 20, 30, 40] for groups A, A, B, B
pub fn create_scenario_a_dataframe() -> DataFrame {
    df! {
        "group" => ["A", "A", "B", "B"],
        "score" => [10.0f64, 20.0, 30.0, 40.0],
    }
    .unwrap()
}

/// Hiring data with demographic columns, a numeric test score and a few
/// nulls in the demographics
pub fn create_hiring_dataframe() -> DataFrame {
    df! {
        "gender" => [Some("F"), Some("M"), Some("F"), Some("M"), Some("F"), Some("M"),
                     Some("F"), Some("M"), Some("F"), Some("M"), Some("F"), Some("M"),
                     None, Some("M"), Some("F"), Some("M")],
        "ethnicity" => ["W", "W", "B", "B", "H", "W", "W", "B", "H", "W",
                        "W", "B", "H", "W", "B", "W"],
        "test_score" => [62.0f64, 81.0, 55.0, 74.0, 68.0, 90.0, 71.0, 66.0,
                         59.0, 85.0, 77.0, 70.0, 64.0, 88.0, 52.0, 79.0],
    }
    .unwrap()
}

/// Larger random applicant pool for stress tests
pub fn create_large_hiring_dataframe(rows: usize, seed: u64) -> DataFrame {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(seed);
    let groups = ["A", "B", "C", "D"];

    let labels: Vec<&str> = (0..rows).map(|_| groups[rng.gen_range(0..groups.len())]).collect();
    let scores: Vec<f64> = (0..rows).map(|_| rng.gen_range(0.0..100.0)).collect();
    let regions: Vec<&str> = (0..rows)
        .map(|_| if rng.gen_bool(0.5) { "north" } else { "south" })
        .collect();

    df! {
        "group" => labels,
        "region" => regions,
        "score" => scores,
    }
    .unwrap()
}

/// Assert two floats agree to within `tol`
pub fn assert_close(actual: f64, expected: f64, tol: f64) {
    assert!(
        (actual - expected).abs() < tol,
        "Expected {} (+/- {}), got {}",
        expected,
        tol,
        actual
    );
}

/// Assert that a DataFrame has expected shape
pub fn assert_shape(df: &DataFrame, expected_rows: usize, expected_cols: usize) {
    let (rows, cols) = df.shape();
    assert_eq!(rows, expected_rows, "Row count mismatch: expected {}, got {}", expected_rows, rows);
    assert_eq!(cols, expected_cols, "Column count mismatch: expected {}, got {}", expected_cols, cols);
}
