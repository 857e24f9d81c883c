//! Item response theory - the Rasch (one-parameter logistic) model

use polars::prelude::*;
use rand::Rng;

use crate::error::{AnalysisError, AnalysisResult};

/// Probability of a correct response for ability `theta` on an item of
/// difficulty `b`: `e^(theta-b) / (1 + e^(theta-b))`
pub fn rasch_irf(theta: f64, b: f64) -> f64 {
    let x = theta - b;
    // Evaluate on the side where exp cannot overflow
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Fisher information of a Rasch item at `theta`: `P(1 - P)`
pub fn rasch_information(theta: f64, b: f64) -> f64 {
    let p = rasch_irf(theta, b);
    p * (1.0 - p)
}

/// Item difficulties from -3.0 to 3.0 in steps of 0.5
pub fn default_difficulties() -> Vec<f64> {
    (-6..=6).map(|step| step as f64 / 2.0).collect()
}

/// Simulate dichotomous responses under the Rasch model.
///
/// One row per ability in `thetas`, one Int32 column of 0/1 responses per
/// difficulty, named `item_{b}` (e.g. `item_-1.5`).
pub fn generate_rasch_responses<R: Rng>(
    thetas: &[f64],
    difficulties: &[f64],
    rng: &mut R,
) -> AnalysisResult<DataFrame> {
    if difficulties.is_empty() {
        return Err(AnalysisError::configuration(
            "at least one item difficulty is required",
        ));
    }
    if let Some(bad) = thetas.iter().chain(difficulties).find(|v| !v.is_finite()) {
        return Err(AnalysisError::configuration(format!(
            "abilities and difficulties must be finite, got {}",
            bad
        )));
    }

    let mut columns = Vec::with_capacity(difficulties.len());
    for &b in difficulties {
        let responses: Vec<i32> = thetas
            .iter()
            .map(|&theta| i32::from(rng.gen_bool(rasch_irf(theta, b))))
            .collect();
        columns.push(Column::new(format!("item_{:?}", b).into(), responses));
    }

    // Duplicate difficulties give duplicate names, which polars rejects
    DataFrame::new(columns).map_err(|e| {
        AnalysisError::configuration(format!("could not build response table: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_irf_at_difficulty() {
        assert!((rasch_irf(1.3, 1.3) - 0.5).abs() < 1e-15);
        assert!((rasch_irf(1.0, 0.0) - 0.731_058_578_630_004_9).abs() < 1e-12);
        assert!((rasch_irf(0.0, 1.0) - 0.268_941_421_369_995_1).abs() < 1e-12);
    }

    #[test]
    fn test_irf_extremes_are_stable() {
        assert_eq!(rasch_irf(1000.0, 0.0), 1.0);
        assert_eq!(rasch_irf(-1000.0, 0.0), 0.0);
        assert!(rasch_irf(-1000.0, 0.0).is_finite());
    }

    #[test]
    fn test_information_peaks_at_difficulty() {
        let b = 0.5;
        let peak = rasch_information(b, b);
        assert!((peak - 0.25).abs() < 1e-15);
        for theta in [-2.0, -0.5, 0.0, 1.0, 3.0] {
            assert!(rasch_information(theta, b) < peak);
        }
    }

    #[test]
    fn test_default_difficulties() {
        let bs = default_difficulties();
        assert_eq!(bs.len(), 13);
        assert_eq!(bs[0], -3.0);
        assert_eq!(bs[6], 0.0);
        assert_eq!(bs[12], 3.0);
    }

    #[test]
    fn test_generated_shape_and_names() {
        let mut rng = StdRng::seed_from_u64(7);
        let thetas = vec![-1.0, 0.0, 1.0, 2.0];
        let df = generate_rasch_responses(&thetas, &default_difficulties(), &mut rng).unwrap();

        assert_eq!(df.shape(), (4, 13));
        assert!(df.column("item_-3.0").is_ok());
        assert!(df.column("item_0.5").is_ok());
        for col in df.get_columns() {
            assert_eq!(col.dtype(), &DataType::Int32);
            let values = col.i32().unwrap();
            assert!(values.into_iter().all(|v| matches!(v, Some(0) | Some(1))));
        }
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let thetas: Vec<f64> = (0..20).map(|i| i as f64 / 5.0 - 2.0).collect();
        let bs = [-1.0, 0.0, 1.0];
        let a = generate_rasch_responses(&thetas, &bs, &mut StdRng::seed_from_u64(99)).unwrap();
        let b = generate_rasch_responses(&thetas, &bs, &mut StdRng::seed_from_u64(99)).unwrap();
        assert!(a.equals(&b));
    }

    #[test]
    fn test_easier_items_answered_more_often() {
        let mut rng = StdRng::seed_from_u64(2024);
        let thetas = vec![0.0; 2000];
        let df = generate_rasch_responses(&thetas, &[-2.0, 2.0], &mut rng).unwrap();
        let easy = df.column("item_-2.0").unwrap().i32().unwrap().sum().unwrap();
        let hard = df.column("item_2.0").unwrap().i32().unwrap().sum().unwrap();
        assert!(easy > hard);
    }

    #[test]
    fn test_invalid_inputs() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(generate_rasch_responses(&[0.0], &[], &mut rng)
            .unwrap_err()
            .is_configuration());
        assert!(generate_rasch_responses(&[f64::NAN], &[0.0], &mut rng)
            .unwrap_err()
            .is_configuration());
        assert!(generate_rasch_responses(&[0.0], &[1.0, 1.0], &mut rng)
            .unwrap_err()
            .is_configuration());
    }
}
