//! Clinical range catalog
//!
//! Maps each numeric health marker to its inclusive plausibility range.
//! The catalog also defines which columns are treated as markers: coercion,
//! range checks and outlier detection apply to catalog columns only.

use serde::{Deserialize, Serialize};

/// Inclusive plausibility bounds for one marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerRange {
    /// Column name in the source table
    pub name: String,
    pub min: f64,
    pub max: f64,
}

impl MarkerRange {
    pub fn new(name: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            min,
            max,
        }
    }

    /// Whether `value` lies within `[min, max]`
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Ordered list of marker ranges
///
/// Order matters: diagnostic columns are emitted in catalog order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RangeCatalog(Vec<MarkerRange>);

impl RangeCatalog {
    pub fn new(ranges: Vec<MarkerRange>) -> Self {
        Self(ranges)
    }

    /// The standard adult reference catalog
    pub fn default_clinical() -> Self {
        Self(vec![
            MarkerRange::new("Blood_glucose", 40.0, 500.0),
            MarkerRange::new("HbA1C", 3.0, 20.0),
            MarkerRange::new("Systolic_BP", 70.0, 250.0),
            MarkerRange::new("Diastolic_BP", 40.0, 150.0),
            MarkerRange::new("LDL", 20.0, 400.0),
            MarkerRange::new("HDL", 10.0, 150.0),
            MarkerRange::new("Triglycerides", 30.0, 1000.0),
            MarkerRange::new("Haemoglobin", 5.0, 25.0),
            MarkerRange::new("MCV", 50.0, 130.0),
        ])
    }

    pub fn ranges(&self) -> &[MarkerRange] {
        &self.0
    }

    /// Marker names in catalog order
    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|r| r.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&MarkerRange> {
        self.0.iter().find(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks the catalog invariants
    ///
    /// # Errors
    ///
    /// Returns a message if the catalog is empty, repeats a marker, or has
    /// a non-finite or inverted range.
    pub fn validate(&self) -> Result<(), String> {
        if self.0.is_empty() {
            return Err("validation.markers cannot be empty".to_string());
        }
        for (idx, range) in self.0.iter().enumerate() {
            if range.name.trim().is_empty() {
                return Err("validation.markers contains an empty marker name".to_string());
            }
            if self.0[..idx].iter().any(|r| r.name == range.name) {
                return Err(format!(
                    "validation.markers lists '{}' more than once",
                    range.name
                ));
            }
            if !range.min.is_finite() || !range.max.is_finite() {
                return Err(format!(
                    "validation.markers '{}' has non-finite bounds",
                    range.name
                ));
            }
            if range.min > range.max {
                return Err(format!(
                    "validation.markers '{}' has min {} greater than max {}",
                    range.name, range.min, range.max
                ));
            }
        }
        Ok(())
    }
}

impl Default for RangeCatalog {
    fn default() -> Self {
        Self::default_clinical()
    }
}
