//! Initial table contents loaded from configuration.

use crate::error::{StorageError, StorageResult};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Initial rows of the table, stored as parallel column lists.
///
/// The JSON document looks like:
///
/// ```json
/// { "INITIAL": { "A": [20, 20], "B": [55, 30] } }
/// ```
///
/// Every list must have the same length; element `i` of each list forms
/// row `i + 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialData {
    /// Column name to column values.
    #[serde(rename = "INITIAL")]
    pub columns: BTreeMap<String, Vec<Value>>,
}

impl InitialData {
    /// Parses initial data from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the columns are uneven.
    pub fn from_json_str(json: &str) -> StorageResult<Self> {
        let data: Self = serde_json::from_str(json)?;
        data.validate()?;
        Ok(data)
    }

    /// Reads initial data from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn from_path(path: &Path) -> StorageResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Checks that all columns have the same length and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UnevenColumns`] naming the first column whose
    /// length differs from the first column's.
    pub fn validate(&self) -> StorageResult<usize> {
        let mut columns = self.columns.iter();
        let Some((_, first)) = columns.next() else {
            return Ok(0);
        };
        let expected = first.len();
        for (name, values) in columns {
            if values.len() != expected {
                return Err(StorageError::UnevenColumns {
                    column: name.clone(),
                    expected,
                    actual: values.len(),
                });
            }
        }
        Ok(expected)
    }
}
