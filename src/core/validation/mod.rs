//! Validation engine
//!
//! Pure, in-memory data-quality pass over a record batch. The engine:
//!
//! 1. Coerces every marker column to floats (unparsable values become missing)
//! 2. Trims and title-cases the categorical columns
//! 3. Reports the missing percentage of every column
//! 4. Flags values outside each marker's clinical range
//! 5. Flags batch-relative IQR outliers per marker
//! 6. Counts flags per record and derives a 0-100 quality score
//!
//! The flagged table keeps every source column and appends, in order,
//! `<marker>_invalid` for each marker, `invalid_count`, `<marker>_outlier`
//! for each marker, `outlier_count` and `quality_score`. Columns that already
//! exist are overwritten in place, so validating a curated table again
//! yields the same table.
//!
//! # Example
//!
//! ```rust
//! use healthmark::config::ValidationConfig;
//! use healthmark::core::validation::ValidationEngine;
//! use healthmark::domain::{Cell, Table};
//!
//! # fn example() -> healthmark::domain::Result<()> {
//! let engine = ValidationEngine::new(ValidationConfig::default());
//!
//! let mut columns = engine.markers();
//! columns.push("Condition".to_string());
//! let mut table = Table::new(columns)?;
//! let mut row = vec![Cell::Real(100.0); 9];
//! row.push(Cell::Text(" healthy ".to_string()));
//! table.push_row(row)?;
//!
//! let outcome = engine.validate(table)?;
//! // HbA1C and Haemoglobin are out of range
//! assert_eq!(outcome.results[0].invalid_count, 2);
//! # Ok(())
//! # }
//! ```

pub mod coerce;
pub mod missing;
pub mod outlier;
pub mod range;
pub mod score;

pub use missing::{MissingEntry, MissingReport};
pub use outlier::IqrBounds;

use crate::config::ValidationConfig;
use crate::domain::{Cell, HealthmarkError, Result, Table};
use coerce::{coerce_numeric, normalize_categorical};
use outlier::outlier_flags;
use range::range_flags;
use score::{quality_score, score_cell};

/// Name of the per-record count of range violations
pub const INVALID_COUNT: &str = "invalid_count";
/// Name of the per-record count of outliers
pub const OUTLIER_COUNT: &str = "outlier_count";
/// Name of the per-record quality score
pub const QUALITY_SCORE: &str = "quality_score";

/// Range flag column for a marker
pub fn invalid_column(marker: &str) -> String {
    format!("{marker}_invalid")
}

/// Outlier flag column for a marker
pub fn outlier_column(marker: &str) -> String {
    format!("{marker}_outlier")
}

/// Diagnostics for one record; flag vectors follow catalog order
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub invalid_flags: Vec<bool>,
    pub outlier_flags: Vec<bool>,
    pub missing_count: usize,
    pub invalid_count: usize,
    pub outlier_count: usize,
    pub quality_score: f64,
}

/// Output of [`ValidationEngine::validate`]
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    /// Source columns, coerced and normalized, plus diagnostic columns
    pub table: Table,
    /// One entry per row of `table`
    pub results: Vec<ValidationResult>,
    /// Missing percentages taken after coercion
    pub missing_report: MissingReport,
    /// Fences per marker in catalog order; `None` when a marker had no values
    pub bounds: Vec<(String, Option<IqrBounds>)>,
}

impl ValidationOutcome {
    /// Total range violations across the batch
    pub fn invalid_total(&self) -> usize {
        self.results.iter().map(|r| r.invalid_count).sum()
    }

    /// Total outliers across the batch
    pub fn outlier_total(&self) -> usize {
        self.results.iter().map(|r| r.outlier_count).sum()
    }

    /// Mean quality score, `None` for an empty batch
    pub fn mean_quality_score(&self) -> Option<f64> {
        if self.results.is_empty() {
            return None;
        }
        let total: f64 = self.results.iter().map(|r| r.quality_score).sum();
        Some(total / self.results.len() as f64)
    }

    /// Records whose score is below `threshold`
    pub fn rows_below(&self, threshold: f64) -> usize {
        self.results
            .iter()
            .filter(|r| r.quality_score < threshold)
            .count()
    }
}

/// Validation engine bound to one configuration
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    config: ValidationConfig,
}

impl ValidationEngine {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Marker column names in catalog order
    pub fn markers(&self) -> Vec<String> {
        self.config.markers.names()
    }

    /// Columns published to the analytics table: markers then categorical columns
    pub fn analytics_columns(&self) -> Vec<String> {
        let mut columns = self.markers();
        columns.extend(self.config.categorical_columns.iter().cloned());
        columns
    }

    /// Checks that every marker and categorical column is present
    ///
    /// # Errors
    ///
    /// Returns `HealthmarkError::Configuration` naming every missing column.
    pub fn check_schema(&self, table: &Table) -> Result<()> {
        let missing: Vec<&str> = self
            .config
            .markers
            .ranges()
            .iter()
            .map(|r| r.name.as_str())
            .chain(self.config.categorical_columns.iter().map(String::as_str))
            .filter(|name| !table.has_column(name))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(HealthmarkError::Configuration(format!(
                "Input is missing configured column(s): {}",
                missing.join(", ")
            )))
        }
    }

    /// Runs the full validation pass
    ///
    /// # Errors
    ///
    /// Fails only on a schema error; bad values never raise.
    pub fn validate(&self, mut table: Table) -> Result<ValidationOutcome> {
        self.check_schema(&table)?;
        let ranges = self.config.markers.ranges();

        let mut values: Vec<Vec<Option<f64>>> = Vec::with_capacity(ranges.len());
        for range in ranges {
            let idx = column_index(&table, &range.name)?;
            let coerced: Vec<Option<f64>> = table.column(idx).map(coerce_numeric).collect();
            table.set_column(&range.name, coerced.iter().map(|v| Cell::from(*v)).collect())?;
            values.push(coerced);
        }

        for column in &self.config.categorical_columns {
            let idx = column_index(&table, column)?;
            table.map_column(idx, normalize_categorical);
        }

        let missing_report = MissingReport::compute(&table);
        match missing_report.to_json() {
            Ok(json) => tracing::info!(missing_report = %json, "Missing value report"),
            Err(e) => tracing::warn!(error = %e, "Could not render missing value report"),
        }

        let invalid: Vec<Vec<bool>> = ranges
            .iter()
            .zip(&values)
            .map(|(range, column)| range_flags(column, range))
            .collect();

        let mut bounds = Vec::with_capacity(ranges.len());
        let mut outliers = Vec::with_capacity(ranges.len());
        for (range, column) in ranges.iter().zip(&values) {
            let fences = IqrBounds::compute(column, self.config.iqr_multiplier);
            if let Some(b) = &fences {
                tracing::debug!(
                    marker = %range.name,
                    q1 = b.q1,
                    q3 = b.q3,
                    lower = b.lower,
                    upper = b.upper,
                    "Outlier fences"
                );
            }
            outliers.push(outlier_flags(column, fences.as_ref(), self.config.zero_iqr_policy));
            bounds.push((range.name.clone(), fences));
        }

        let results: Vec<ValidationResult> = (0..table.len())
            .map(|row| {
                let invalid_flags: Vec<bool> = invalid.iter().map(|c| c[row]).collect();
                let outlier_flags: Vec<bool> = outliers.iter().map(|c| c[row]).collect();
                let missing_count = values.iter().filter(|c| c[row].is_none()).count();
                let invalid_count = invalid_flags.iter().filter(|f| **f).count();
                let outlier_count = outlier_flags.iter().filter(|f| **f).count();
                ValidationResult {
                    quality_score: quality_score(
                        missing_count,
                        invalid_count,
                        outlier_count,
                        &self.config.weights,
                    ),
                    invalid_flags,
                    outlier_flags,
                    missing_count,
                    invalid_count,
                    outlier_count,
                }
            })
            .collect();

        for (range, flags) in ranges.iter().zip(&invalid) {
            table.set_column(&invalid_column(&range.name), bool_cells(flags))?;
        }
        table.set_column(
            INVALID_COUNT,
            results.iter().map(|r| count_cell(r.invalid_count)).collect(),
        )?;
        for (range, flags) in ranges.iter().zip(&outliers) {
            table.set_column(&outlier_column(&range.name), bool_cells(flags))?;
        }
        table.set_column(
            OUTLIER_COUNT,
            results.iter().map(|r| count_cell(r.outlier_count)).collect(),
        )?;
        table.set_column(
            QUALITY_SCORE,
            results.iter().map(|r| score_cell(r.quality_score)).collect(),
        )?;

        let outcome = ValidationOutcome {
            table,
            results,
            missing_report,
            bounds,
        };
        tracing::debug!(
            rows = outcome.results.len(),
            invalid = outcome.invalid_total(),
            outliers = outcome.outlier_total(),
            "Validation pass complete"
        );
        Ok(outcome)
    }
}

fn column_index(table: &Table, name: &str) -> Result<usize> {
    table
        .column_index(name)
        .ok_or_else(|| HealthmarkError::Configuration(format!("Input is missing column {name}")))
}

fn bool_cells(flags: &[bool]) -> Vec<Cell> {
    flags.iter().map(|f| Cell::Bool(*f)).collect()
}

fn count_cell(count: usize) -> Cell {
    Cell::Integer(count as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ZeroIqrPolicy;

    /// Nine in-range markers plus Condition, in catalog order
    fn healthy_row() -> Vec<Cell> {
        vec![
            Cell::Real(95.0),
            Cell::Real(5.4),
            Cell::Integer(120),
            Cell::Integer(80),
            Cell::Real(110.0),
            Cell::Real(55.0),
            Cell::Real(140.0),
            Cell::Real(14.2),
            Cell::Real(90.0),
            "healthy".into(),
        ]
    }

    fn batch(rows: Vec<Vec<Cell>>) -> Table {
        let mut columns = ValidationConfig::default().markers.names();
        columns.push("Condition".to_string());
        Table::with_rows(columns, rows).unwrap()
    }

    fn engine() -> ValidationEngine {
        ValidationEngine::new(ValidationConfig::default())
    }

    fn cell<'a>(table: &'a Table, row: usize, column: &str) -> &'a Cell {
        &table.rows()[row][table.column_index(column).unwrap()]
    }

    #[test]
    fn test_out_of_range_glucose_scores_ninety() {
        let glucose = [100.0, 150.0, 200.0, 250.0, 300.0, 350.0, 400.0, 450.0, 500.0, 600.0];
        let rows = glucose
            .iter()
            .map(|g| {
                let mut row = healthy_row();
                row[0] = Cell::Real(*g);
                row
            })
            .collect();

        let outcome = engine().validate(batch(rows)).unwrap();
        let last = &outcome.results[9];
        assert!(last.invalid_flags[0]);
        assert_eq!(last.invalid_count, 1);
        assert_eq!(last.outlier_count, 0);
        assert_eq!(last.quality_score, 90.0);
        assert_eq!(cell(&outcome.table, 9, "Blood_glucose_invalid"), &Cell::Bool(true));
        assert_eq!(cell(&outcome.table, 9, "quality_score"), &Cell::Integer(90));
    }

    #[test]
    fn test_missing_marker_scores_ninety_five() {
        let mut rows = vec![healthy_row(); 5];
        rows[2][1] = Cell::Null;

        let outcome = engine().validate(batch(rows)).unwrap();
        let result = &outcome.results[2];
        assert_eq!(result.missing_count, 1);
        assert_eq!(result.invalid_count, 0);
        assert!(!result.invalid_flags[1]);
        assert_eq!(result.quality_score, 95.0);
        assert_eq!(outcome.missing_report.get("HbA1C"), Some(20.0));
    }

    #[test]
    fn test_unparsable_text_becomes_missing() {
        let mut rows = vec![healthy_row(); 3];
        rows[0][4] = "n/a".into();
        rows[1][4] = " 130 ".into();

        let outcome = engine().validate(batch(rows)).unwrap();
        assert_eq!(cell(&outcome.table, 0, "LDL"), &Cell::Null);
        assert_eq!(cell(&outcome.table, 1, "LDL"), &Cell::Real(130.0));
        assert_eq!(outcome.results[0].missing_count, 1);
        assert_eq!(outcome.results[0].invalid_count, 0);
    }

    #[test]
    fn test_condition_is_normalized() {
        let mut row = healthy_row();
        row[9] = "  type 2 DIABETES ".into();
        let outcome = engine().validate(batch(vec![row])).unwrap();
        assert_eq!(
            cell(&outcome.table, 0, "Condition"),
            &Cell::Text("Type 2 Diabetes".into())
        );
    }

    #[test]
    fn test_single_systolic_outlier() {
        let systolic = [118, 120, 122, 125, 119, 121, 124, 123, 117, 240];
        let rows = systolic
            .iter()
            .map(|s| {
                let mut row = healthy_row();
                row[2] = Cell::Integer(*s);
                row
            })
            .collect();

        let outcome = engine().validate(batch(rows)).unwrap();
        for (i, result) in outcome.results.iter().enumerate() {
            assert_eq!(result.outlier_flags[2], i == 9, "row {i}");
        }
        assert_eq!(cell(&outcome.table, 9, "Systolic_BP_outlier"), &Cell::Bool(true));
        assert_eq!(outcome.outlier_total(), 1);
    }

    #[test]
    fn test_zero_iqr_policy_is_configurable() {
        let mut rows = vec![healthy_row(); 5];
        rows[4][5] = Cell::Real(60.0);

        let flagged = engine().validate(batch(rows.clone())).unwrap();
        assert!(flagged.results[4].outlier_flags[5]);

        let config = ValidationConfig {
            zero_iqr_policy: ZeroIqrPolicy::Skip,
            ..ValidationConfig::default()
        };
        let skipped = ValidationEngine::new(config).validate(batch(rows)).unwrap();
        assert!(!skipped.results[4].outlier_flags[5]);
    }

    #[test]
    fn test_diagnostic_column_order() {
        let outcome = engine().validate(batch(vec![healthy_row()])).unwrap();
        let columns = outcome.table.columns();
        let markers = engine().markers();

        assert_eq!(columns.len(), 10 + 9 + 1 + 9 + 1 + 1);
        assert_eq!(columns[10], "Blood_glucose_invalid");
        assert_eq!(columns[19], INVALID_COUNT);
        assert_eq!(columns[20], "Blood_glucose_outlier");
        assert_eq!(columns[29], OUTLIER_COUNT);
        assert_eq!(columns[30], QUALITY_SCORE);
        for (i, marker) in markers.iter().enumerate() {
            assert_eq!(columns[10 + i], invalid_column(marker));
            assert_eq!(columns[20 + i], outlier_column(marker));
        }
    }

    #[test]
    fn test_revalidating_curated_table_is_stable() {
        let mut rows = vec![healthy_row(); 6];
        rows[1][0] = Cell::Real(700.0);
        rows[3][6] = Cell::Null;

        let first = engine().validate(batch(rows)).unwrap();
        let second = engine().validate(first.table.clone()).unwrap();

        assert_eq!(first.table, second.table);
        assert_eq!(first.results, second.results);
    }

    #[test]
    fn test_extra_columns_pass_through() {
        let mut table = batch(vec![healthy_row()]);
        table
            .set_column("patient_ref", vec![Cell::Text("P-001".into())])
            .unwrap();

        let outcome = engine().validate(table).unwrap();
        assert_eq!(cell(&outcome.table, 0, "patient_ref"), &Cell::Text("P-001".into()));
    }

    #[test]
    fn test_missing_marker_column_is_configuration_error() {
        let table = Table::with_rows(
            vec!["Blood_glucose".to_string(), "Condition".to_string()],
            vec![vec![Cell::Real(90.0), "Healthy".into()]],
        )
        .unwrap();

        let err = engine().validate(table).unwrap_err();
        match err {
            HealthmarkError::Configuration(msg) => {
                assert!(msg.contains("HbA1C"));
                assert!(msg.contains("MCV"));
                assert!(!msg.contains("Blood_glucose"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_batch() {
        let outcome = engine().validate(batch(Vec::new())).unwrap();
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.mean_quality_score(), None);
        assert_eq!(outcome.missing_report.get("LDL"), Some(0.0));
        assert!(outcome.bounds.iter().all(|(_, b)| b.is_none()));
    }

    #[test]
    fn test_outcome_aggregates() {
        let mut rows = vec![healthy_row(); 4];
        rows[0][7] = Cell::Real(30.0);
        rows[1][8] = Cell::Null;

        let outcome = engine().validate(batch(rows)).unwrap();
        assert_eq!(outcome.invalid_total(), 1);
        assert_eq!(outcome.rows_below(95.0), 1);
        assert!(outcome.mean_quality_score().unwrap() < 100.0);
    }

    #[test]
    fn test_analytics_columns() {
        let columns = engine().analytics_columns();
        assert_eq!(columns.len(), 10);
        assert_eq!(columns.last().map(String::as_str), Some("Condition"));
    }
}
