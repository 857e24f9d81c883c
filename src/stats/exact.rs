//! Fisher's exact test for 2x2 contingency tables
//!
//! Conditioning on both margins, the top-left cell of a 2x2 table follows a
//! hypergeometric distribution. The p-value sums the probabilities of all
//! tables that are at least as extreme as the observed one.
//!
//! Probabilities are built with the ratio recurrence between neighbouring
//! hypergeometric terms, starting from the mode and normalising at the end.
//! This avoids factorials entirely and stays accurate to a few ulps for any
//! table size that fits in memory.

use serde::{Deserialize, Serialize};

/// Relative tolerance used when deciding whether a table is "as extreme" as
/// the observed one in the two-sided test. Probabilities equal up to this
/// factor are treated as ties (the same convention as R's `fisher.test`).
const TIE_TOLERANCE: f64 = 1e-7;

/// Alternative hypothesis for the exact test
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Alternative {
    /// Odds ratio differs from 1 (default)
    #[default]
    TwoSided,
    /// Odds ratio of the table is less than 1
    Less,
    /// Odds ratio of the table is greater than 1
    Greater,
}

impl std::fmt::Display for Alternative {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Alternative::TwoSided => write!(f, "two-sided"),
            Alternative::Less => write!(f, "less"),
            Alternative::Greater => write!(f, "greater"),
        }
    }
}

impl std::str::FromStr for Alternative {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "two-sided" | "two_sided" => Ok(Alternative::TwoSided),
            "less" => Ok(Alternative::Less),
            "greater" => Ok(Alternative::Greater),
            _ => Err(format!(
                "Unknown alternative: '{}'. Use 'two-sided', 'less' or 'greater'.",
                s
            )),
        }
    }
}

/// Hypergeometric probabilities of the top-left cell given the margins.
///
/// Returns the smallest attainable cell value and the probabilities for every
/// attainable value from there upward.
fn hypergeometric_support(total: u64, row_total: u64, col_total: u64) -> (u64, Vec<f64>) {
    let other_rows = total - row_total;
    let lo = col_total.saturating_sub(other_rows);
    let hi = row_total.min(col_total);

    let mode_estimate =
        ((col_total as u128 + 1) * (row_total as u128 + 1) / (total as u128 + 2)) as u64;
    let mode = mode_estimate.clamp(lo, hi);

    let len = (hi - lo + 1) as usize;
    let mut weights = vec![0.0f64; len];
    weights[(mode - lo) as usize] = 1.0;

    // Walk up from the mode: P(k+1)/P(k) = (n-k)(N-k) / ((k+1)(M-n-N+k+1))
    for k in mode..hi {
        let num = (row_total - k) as f64 * (col_total - k) as f64;
        let den = (k + 1) as f64 * (other_rows + k + 1 - col_total) as f64;
        let idx = (k - lo) as usize;
        weights[idx + 1] = weights[idx] * num / den;
    }

    // Walk down from the mode: P(k-1)/P(k) = k(M-n-N+k) / ((n-k+1)(N-k+1))
    for k in ((lo + 1)..=mode).rev() {
        let num = k as f64 * (other_rows + k - col_total) as f64;
        let den = (row_total - k + 1) as f64 * (col_total - k + 1) as f64;
        let idx = (k - lo) as usize;
        weights[idx - 1] = weights[idx] * num / den;
    }

    let norm: f64 = weights.iter().sum();
    for w in weights.iter_mut() {
        *w /= norm;
    }

    (lo, weights)
}

/// Fisher's exact test on a 2x2 table of counts.
///
/// `table` is `[[a, b], [c, d]]`; the test conditions on its row and column
/// totals. Degenerate tables (an empty row or column) carry no evidence and
/// yield a p-value of 1.
///
/// The two-sided p-value sums every table whose probability does not exceed
/// the observed table's probability, which is the definition used by SciPy
/// and R.
pub fn fisher_exact(table: [[u64; 2]; 2], alternative: Alternative) -> f64 {
    let [[a, b], [c, d]] = table;
    let row_total = a + b;
    let col_total = a + c;
    let total = a + b + c + d;

    let (lo, pmf) = hypergeometric_support(total, row_total, col_total);
    let observed = (a - lo) as usize;

    let p = match alternative {
        Alternative::Less => pmf[..=observed].iter().sum(),
        Alternative::Greater => pmf[observed..].iter().sum(),
        Alternative::TwoSided => {
            let cutoff = pmf[observed] * (1.0 + TIE_TOLERANCE);
            pmf.iter().filter(|&&p| p <= cutoff).sum::<f64>()
        }
    };

    p.min(1.0)
}

/// Two-sided Fisher exact p-value
pub fn fisher_exact_two_sided(table: [[u64; 2]; 2]) -> f64 {
    fisher_exact(table, Alternative::TwoSided)
}
