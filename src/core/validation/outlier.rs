//! Batch-relative outlier detection with Tukey fences

use crate::config::ZeroIqrPolicy;
use serde::Serialize;

/// Quantile of sorted values by linear interpolation between closest ranks
///
/// Returns `None` for an empty slice. Equal neighbours are returned as is,
/// so two infinite ranks yield that infinity rather than NaN.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi || sorted[lo] == sorted[hi] {
        return Some(sorted[lo]);
    }
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Quartiles and fences for one marker
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IqrBounds {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrBounds {
    /// Computes fences over the non-missing values; `None` if there are none
    pub fn compute(values: &[Option<f64>], multiplier: f64) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().flatten().copied().collect();
        sorted.sort_by(f64::total_cmp);

        let q1 = quantile(&sorted, 0.25)?;
        let q3 = quantile(&sorted, 0.75)?;
        let iqr = q3 - q1;
        Some(Self {
            q1,
            q3,
            lower: q1 - multiplier * iqr,
            upper: q3 + multiplier * iqr,
        })
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// Strictly below the lower fence or above the upper one
    ///
    /// A NaN fence compares false, so it flags nothing.
    pub fn is_outside(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }
}

/// Flags values outside the fences
///
/// Missing values are never flagged. With [`ZeroIqrPolicy::Skip`], a marker
/// whose IQR is zero flags nothing.
pub fn outlier_flags(
    values: &[Option<f64>],
    bounds: Option<&IqrBounds>,
    policy: ZeroIqrPolicy,
) -> Vec<bool> {
    let Some(bounds) = bounds else {
        return vec![false; values.len()];
    };
    if policy == ZeroIqrPolicy::Skip && bounds.iqr() == 0.0 {
        return vec![false; values.len()];
    }
    values
        .iter()
        .map(|v| matches!(v, Some(value) if bounds.is_outside(*value)))
        .collect()
}
