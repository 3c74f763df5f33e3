//! Composite quality score

use crate::config::QualityWeights;
use crate::domain::Cell;

/// Maximum score of a record with no problems
pub const MAX_SCORE: f64 = 100.0;

/// `100 - w_missing*missing - w_invalid*invalid - w_outlier*outlier`, clipped at 0
pub fn quality_score(missing: usize, invalid: usize, outlier: usize, weights: &QualityWeights) -> f64 {
    let penalty = weights.missing * missing as f64
        + weights.invalid * invalid as f64
        + weights.outlier * outlier as f64;
    (MAX_SCORE - penalty).max(0.0)
}

/// Stores whole scores as integers and fractional ones as reals
pub(crate) fn score_cell(score: f64) -> Cell {
    if score.fract() == 0.0 {
        Cell::Integer(score as i64)
    } else {
        Cell::Real(score)
    }
}
