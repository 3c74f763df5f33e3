//! Domain identifier types with validation
//!
//! Newtype wrappers for table names and run identifiers. Each type keeps
//! callers from passing an arbitrary string where a validated name is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

/// Longest table name accepted (PostgreSQL truncates identifiers at 63 bytes)
const MAX_TABLE_NAME_LEN: usize = 63;

/// Table name newtype wrapper
///
/// Names are used as quoted identifiers, so any printable text is allowed
/// except control characters. Leading/trailing whitespace is rejected.
///
/// # Examples
///
/// ```
/// use healthmark::domain::ids::TableName;
/// use std::str::FromStr;
///
/// let name = TableName::from_str("health_markers_curated").unwrap();
/// assert_eq!(name.as_str(), "health_markers_curated");
/// assert!(TableName::from_str("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableName(String);

impl TableName {
    /// Creates a new TableName from a string
    ///
    /// # Errors
    ///
    /// Returns `Err` if the name is empty, too long, padded with whitespace
    /// or contains control characters.
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        if name.is_empty() {
            return Err("Table name cannot be empty".to_string());
        }
        if name.trim() != name {
            return Err(format!(
                "Table name '{name}' cannot start or end with whitespace"
            ));
        }
        if name.len() > MAX_TABLE_NAME_LEN {
            return Err(format!(
                "Table name '{name}' exceeds {MAX_TABLE_NAME_LEN} bytes"
            ));
        }
        if name.chars().any(char::is_control) {
            return Err(format!("Table name '{name}' contains control characters"));
        }
        Ok(Self(name))
    }

    /// Wraps a built-in name known to be valid
    pub(crate) fn from_static(name: &'static str) -> Self {
        debug_assert!(Self::new(name).is_ok(), "invalid built-in table name");
        Self(name.to_string())
    }

    /// Derives a table name from a file's base name (without extension)
    pub fn from_file_stem(path: &Path) -> Result<Self, String> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| format!("Cannot derive table name from {}", path.display()))?;
        Self::new(stem)
    }

    /// Returns the table name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TableName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TableName {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TableName> for String {
    fn from(name: TableName) -> Self {
        name.0
    }
}

impl AsRef<str> for TableName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Pipeline run identifier
///
/// A random UUID generated at the start of every run. It ties together the
/// log span, the run summary and the metadata row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a fresh run ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RunId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid run ID '{s}': {e}"))
    }
}
