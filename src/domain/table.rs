//! In-memory tabular data
//!
//! A [`Table`] is the unit every store loads and saves: ordered column
//! names plus rows of [`Cell`]s. The validation engine works on tables
//! directly so extra source columns travel through the pipeline untouched.

use crate::domain::{HealthmarkError, Result};
use std::fmt;

/// A single stored value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Absent value
    Null,
    /// 64-bit integer
    Integer(i64),
    /// 64-bit float
    Real(f64),
    /// UTF-8 text
    Text(String),
    /// Boolean flag
    Bool(bool),
}

impl Cell {
    /// Returns true for `Cell::Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Numeric view of the cell, without parsing text
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Integer(v) => Some(*v as f64),
            Cell::Real(v) => Some(*v),
            Cell::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Cell::Null | Cell::Text(_) => None,
        }
    }

    /// Integer view of the cell, without parsing text
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Cell::Integer(v) => Some(*v),
            Cell::Bool(v) => Some(i64::from(*v)),
            Cell::Real(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            _ => None,
        }
    }

    /// Borrowed text, if the cell holds text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Renders any non-null cell as text
    pub fn to_text(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Integer(v) => Some(v.to_string()),
            Cell::Real(v) => Some(v.to_string()),
            Cell::Bool(v) => Some(v.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => write!(f, "NULL"),
            Cell::Integer(v) => write!(f, "{v}"),
            Cell::Real(v) => write!(f, "{v}"),
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map(Cell::Real).unwrap_or(Cell::Null)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Integer(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

/// Storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Real,
    Boolean,
    Text,
}

/// Ordered columns plus rows of cells
///
/// Invariants: column names are unique, every row has one cell per column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Creates an empty table with the given columns
    ///
    /// # Errors
    ///
    /// Returns an error if a column name repeats.
    pub fn new(columns: Vec<String>) -> Result<Self> {
        for (idx, name) in columns.iter().enumerate() {
            if columns[..idx].contains(name) {
                return Err(HealthmarkError::Validation(format!(
                    "Duplicate column name '{name}'"
                )));
            }
        }
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    /// Creates a table and appends every row
    pub fn with_rows(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        let mut table = Self::new(columns)?;
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Appends a row
    ///
    /// # Errors
    ///
    /// Returns an error if the row width differs from the column count.
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(HealthmarkError::Validation(format!(
                "Row has {} cells but table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Iterates the cells of one column
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().map(move |row| &row[idx])
    }

    /// Replaces a column in place, or appends it when absent
    ///
    /// # Errors
    ///
    /// Returns an error if `values` doesn't hold one cell per row.
    pub fn set_column(&mut self, name: &str, values: Vec<Cell>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(HealthmarkError::Validation(format!(
                "Column '{name}' has {} values but table has {} rows",
                values.len(),
                self.rows.len()
            )));
        }
        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    /// Rewrites every cell of an existing column
    pub fn map_column<F>(&mut self, idx: usize, mut f: F)
    where
        F: FnMut(&Cell) -> Cell,
    {
        for row in &mut self.rows {
            row[idx] = f(&row[idx]);
        }
    }

    /// Builds a new table holding only the named columns, in the given order
    ///
    /// # Errors
    ///
    /// Returns an error naming every requested column that is absent.
    pub fn project(&self, columns: &[String]) -> Result<Table> {
        let mut indices = Vec::with_capacity(columns.len());
        let mut missing = Vec::new();
        for name in columns {
            match self.column_index(name) {
                Some(idx) => indices.push(idx),
                None => missing.push(name.as_str()),
            }
        }
        if !missing.is_empty() {
            return Err(HealthmarkError::Validation(format!(
                "Cannot project missing columns: {}",
                missing.join(", ")
            )));
        }

        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Table::with_rows(columns.to_vec(), rows)
    }

    /// Keeps the rows for which `predicate` returns true
    pub fn filter_rows<F>(&self, mut predicate: F) -> Table
    where
        F: FnMut(&[Cell]) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| predicate(row))
                .cloned()
                .collect(),
        }
    }

    /// Infers the storage type of a column
    ///
    /// Text wins over everything, then real, then integer, then boolean.
    /// A column holding only nulls is text.
    pub fn column_kind(&self, idx: usize) -> ColumnKind {
        let (mut text, mut real, mut integer, mut boolean) = (false, false, false, false);
        for cell in self.column(idx) {
            match cell {
                Cell::Text(_) => text = true,
                Cell::Real(_) => real = true,
                Cell::Integer(_) => integer = true,
                Cell::Bool(_) => boolean = true,
                Cell::Null => {}
            }
        }
        if text {
            ColumnKind::Text
        } else if real {
            ColumnKind::Real
        } else if integer {
            ColumnKind::Integer
        } else if boolean {
            ColumnKind::Boolean
        } else {
            ColumnKind::Text
        }
    }

    /// Consumes the table and returns its parts
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Cell>>) {
        (self.columns, self.rows)
    }
}
