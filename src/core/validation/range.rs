//! Clinical range checks

use crate::domain::MarkerRange;

/// Flags each value outside the inclusive range; missing values are never flagged
pub fn range_flags(values: &[Option<f64>], range: &MarkerRange) -> Vec<bool> {
    values
        .iter()
        .map(|v| matches!(v, Some(value) if !range.contains(*value)))
        .collect()
}
