//! CSV parsing with per-column type inference
//!
//! A column becomes `Integer` when every non-missing field parses as `i64`,
//! `Real` when every one parses as `f64`, and `Text` otherwise. Empty
//! fields and the usual spreadsheet NA markers are read as `Null`.

use crate::domain::{Cell, HealthmarkError, Result, Table};
use std::path::Path;

/// Field values read as missing
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-NaN", "-nan", "<NA>", "N/A", "NA", "NULL", "NaN", "None",
    "n/a", "nan", "null",
];

/// Reads a delimited file with a header row into a typed table
///
/// # Errors
///
/// Returns `HealthmarkError::Ingestion` for unreadable files, ragged rows or
/// duplicate headers.
pub fn read_csv_table(path: &Path, delimiter: u8) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_path(path)?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(HealthmarkError::Ingestion(format!(
            "{} has no header row",
            path.display()
        )));
    }

    let mut raw: Vec<Vec<Option<String>>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        raw.push(
            record
                .iter()
                .map(|field| (!is_na(field)).then(|| field.to_string()))
                .collect(),
        );
    }

    let kinds: Vec<Inferred> = (0..headers.len())
        .map(|idx| infer(raw.iter().filter_map(|row| row[idx].as_deref())))
        .collect();

    let rows = raw
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&kinds)
                .map(|(field, kind)| to_cell(field, *kind))
                .collect()
        })
        .collect();

    Table::with_rows(headers, rows)
        .map_err(|e| HealthmarkError::Ingestion(format!("{}: {e}", path.display())))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Inferred {
    Integer,
    Real,
    Text,
}

fn is_na(field: &str) -> bool {
    NA_TOKENS.contains(&field.trim())
}

fn infer<'a>(fields: impl Iterator<Item = &'a str>) -> Inferred {
    let mut kind = Inferred::Integer;
    for field in fields {
        let field = field.trim();
        if kind == Inferred::Integer && field.parse::<i64>().is_err() {
            kind = Inferred::Real;
        }
        if kind == Inferred::Real && field.parse::<f64>().is_err() {
            return Inferred::Text;
        }
    }
    kind
}

fn to_cell(field: Option<String>, kind: Inferred) -> Cell {
    let Some(field) = field else {
        return Cell::Null;
    };
    match kind {
        Inferred::Integer => field.trim().parse().map_or(Cell::Null, Cell::Integer),
        Inferred::Real => field.trim().parse().map_or(Cell::Null, Cell::Real),
        Inferred::Text => Cell::Text(field),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_column_types_are_inferred() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "markers.csv",
            "id,LDL,Condition\n1,120.5,healthy\n2,,Anemia\n3,98,NA\n",
        );

        let table = read_csv_table(&path, b',').unwrap();
        assert_eq!(table.columns(), &["id", "LDL", "Condition"]);
        assert_eq!(table.rows()[0], vec![Cell::Integer(1), Cell::Real(120.5), "healthy".into()]);
        assert_eq!(table.rows()[1][1], Cell::Null);
        assert_eq!(table.rows()[2][1], Cell::Real(98.0));
        assert_eq!(table.rows()[2][2], Cell::Null);
    }

    #[test]
    fn test_mixed_column_falls_back_to_text() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "mixed.csv", "HbA1C\n5.6\nhigh\n7\n");

        let table = read_csv_table(&path, b',').unwrap();
        assert_eq!(
            table.column(0).cloned().collect::<Vec<_>>(),
            vec![Cell::from("5.6"), Cell::from("high"), Cell::from("7")]
        );
    }

    #[test]
    fn test_custom_delimiter() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "semi.csv", "HDL;MCV\n55;90\n");

        let table = read_csv_table(&path, b';').unwrap();
        assert_eq!(table.rows()[0], vec![Cell::Integer(55), Cell::Integer(90)]);
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "ragged.csv", "a,b\n1,2\n3\n");

        let result = read_csv_table(&path, b',');
        assert!(matches!(result, Err(HealthmarkError::Ingestion(_))));
    }

    #[test]
    fn test_duplicate_headers_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "dup.csv", "LDL,LDL\n1,2\n");

        assert!(read_csv_table(&path, b',').is_err());
    }

    #[test]
    fn test_header_only_file() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "empty.csv", "LDL,HDL\n");

        let table = read_csv_table(&path, b',').unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns().len(), 2);
    }
}
