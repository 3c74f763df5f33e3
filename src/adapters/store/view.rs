//! Derived-table definitions
//!
//! A [`ViewDefinition`] describes a table built from another table by
//! projecting columns and filtering rows. Backends render it to SQL; the
//! pipeline's dry run evaluates it in memory with [`ViewDefinition::apply`].

use crate::domain::{Result, Table, TableName};

/// Row predicate for a derived table
#[derive(Debug, Clone, PartialEq)]
pub enum RowFilter {
    /// Keep rows whose numeric `column` is `>= threshold`; nulls and
    /// non-numeric cells are dropped
    AtLeast { column: String, threshold: f64 },
}

impl RowFilter {
    fn to_sql(&self) -> String {
        match self {
            // {:?} keeps a decimal point or exponent, which both SQL dialects parse
            RowFilter::AtLeast { column, threshold } => {
                format!("{} >= {:?}", quote_ident(column), threshold)
            }
        }
    }
}

/// A table derived as `SELECT columns FROM source WHERE filter`
#[derive(Debug, Clone, PartialEq)]
pub struct ViewDefinition {
    /// Table to (re)create
    pub target: TableName,
    /// Table read from
    pub source: TableName,
    /// Projected columns, in output order
    pub columns: Vec<String>,
    pub filter: RowFilter,
}

impl ViewDefinition {
    /// Renders the defining query with quoted identifiers
    ///
    /// # Example
    ///
    /// ```
    /// use healthmark::adapters::store::{RowFilter, ViewDefinition};
    /// use healthmark::domain::TableName;
    ///
    /// let view = ViewDefinition {
    ///     target: TableName::new("analytics").unwrap(),
    ///     source: TableName::new("curated").unwrap(),
    ///     columns: vec!["LDL".to_string(), "Condition".to_string()],
    ///     filter: RowFilter::AtLeast { column: "quality_score".to_string(), threshold: 80.0 },
    /// };
    /// assert_eq!(
    ///     view.to_select_sql(),
    ///     r#"SELECT "LDL", "Condition" FROM "curated" WHERE "quality_score" >= 80.0"#
    /// );
    /// ```
    pub fn to_select_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "SELECT {} FROM {} WHERE {}",
            columns,
            quote_ident(self.source.as_str()),
            self.filter.to_sql()
        )
    }

    /// Evaluates the view against an in-memory copy of the source table
    ///
    /// # Errors
    ///
    /// Returns an error if a projected or filter column is missing.
    pub fn apply(&self, source: &Table) -> Result<Table> {
        let filtered = match &self.filter {
            RowFilter::AtLeast { column, threshold } => {
                let idx = source.column_index(column).ok_or_else(|| {
                    crate::domain::HealthmarkError::Validation(format!(
                        "Filter column '{column}' not found in {}",
                        self.source
                    ))
                })?;
                source.filter_rows(|row| row[idx].as_f64().is_some_and(|v| v >= *threshold))
            }
        };
        filtered.project(&self.columns)
    }
}

/// Quotes an SQL identifier, doubling embedded quotes
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
