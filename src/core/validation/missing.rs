//! Per-column missing value report

use crate::domain::{Cell, Result, Table};
use serde::Serialize;

/// Share of missing values in one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingEntry {
    pub column: String,
    /// Percentage in [0, 100], rounded to 2 decimals
    pub missing_percentage: f64,
}

/// Missing percentages for every column of a batch, in column order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MissingReport {
    entries: Vec<MissingEntry>,
}

impl MissingReport {
    /// Computes the report; an empty table reports 0.0 everywhere
    pub fn compute(table: &Table) -> Self {
        let rows = table.len();
        let entries = table
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let missing = table.column(idx).filter(|c| is_missing(c)).count();
                let percentage = if rows == 0 {
                    0.0
                } else {
                    round2(missing as f64 / rows as f64 * 100.0)
                };
                MissingEntry {
                    column: column.clone(),
                    missing_percentage: percentage,
                }
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[MissingEntry] {
        &self.entries
    }

    /// Missing percentage of a column, if it was part of the batch
    pub fn get(&self, column: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.column == column)
            .map(|e| e.missing_percentage)
    }

    /// Renders the report as a JSON array
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.entries)?)
    }
}

fn is_missing(cell: &Cell) -> bool {
    match cell {
        Cell::Null => true,
        Cell::Real(v) => v.is_nan(),
        _ => false,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_percentages() {
        let table = Table::with_rows(
            vec!["LDL".to_string(), "Condition".to_string()],
            vec![
                vec![Cell::Real(100.0), Cell::Null],
                vec![Cell::Null, "Healthy".into()],
                vec![Cell::Real(f64::NAN), "Healthy".into()],
            ],
        )
        .unwrap();

        let report = MissingReport::compute(&table);
        assert_eq!(report.get("LDL"), Some(66.67));
        assert_eq!(report.get("Condition"), Some(33.33));
        assert_eq!(report.get("HDL"), None);
    }

    #[test]
    fn test_empty_batch_reports_zero() {
        let table = Table::new(vec!["LDL".to_string()]).unwrap();
        let report = MissingReport::compute(&table);
        assert_eq!(report.get("LDL"), Some(0.0));
    }

    #[test]
    fn test_json_rendering() {
        let table = Table::with_rows(vec!["HDL".to_string()], vec![vec![Cell::Null]]).unwrap();
        let json = MissingReport::compute(&table).to_json().unwrap();
        assert_eq!(json, r#"[{"column":"HDL","missing_percentage":100.0}]"#);
    }
}
