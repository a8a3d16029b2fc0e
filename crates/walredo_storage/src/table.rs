//! Table store trait and the shared in-memory table layout.

use crate::error::{StorageError, StorageResult};
use crate::seed::InitialData;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a table row.
///
/// Row ids start at 1, matching an autoincrement primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub u64);

impl RowId {
    /// Creates a new row ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row:{}", self.0)
    }
}

/// A persistent table addressed by `(column, row)`.
///
/// This is the only surface the redo engine touches. Implementations do not
/// model transactions or rollback: a successful `write` is visible to the
/// next `read` immediately.
///
/// # Invariants
///
/// - `read` and `write` fail with [`StorageError::RowNotFound`] for an
///   unknown row and [`StorageError::ColumnNotFound`] for an unknown column
/// - `write` otherwise always succeeds
/// - `seed` replaces the whole table
///
/// # Implementors
///
/// - [`super::InMemoryTable`] - For testing
/// - [`super::FileTable`] - For persistent storage
pub trait TableStore: Send + Sync {
    /// Reads the value stored at `(column, row)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the row or column does not exist.
    fn read(&self, column: &str, row: RowId) -> StorageResult<Value>;

    /// Overwrites the value stored at `(column, row)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the row or column does not exist, or if a
    /// write-through store fails to persist.
    fn write(&mut self, column: &str, row: RowId, value: Value) -> StorageResult<()>;

    /// Drops every row and recreates the table from initial data.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial data columns have uneven lengths.
    fn seed(&mut self, initial: &InitialData) -> StorageResult<()>;

    /// Returns a copy of the whole table.
    fn snapshot(&self) -> TableData;

    /// Makes all previous writes durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be persisted.
    fn flush(&mut self) -> StorageResult<()>;

    /// Returns the column names in table order.
    fn columns(&self) -> Vec<String> {
        self.snapshot().columns().to_vec()
    }

    /// Returns the number of rows.
    fn row_count(&self) -> usize {
        self.snapshot().row_count()
    }
}

/// Row-oriented table contents shared by the store implementations.
///
/// This is also the on-disk document format of [`super::FileTable`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableData {
    columns: Vec<String>,
    rows: BTreeMap<RowId, BTreeMap<String, Value>>,
}

impl TableData {
    /// Creates an empty table with the given columns.
    #[must_use]
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: BTreeMap::new(),
        }
    }

    /// Builds a table from validated initial data.
    ///
    /// Row `i` (1-based) receives element `i - 1` of every column.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UnevenColumns`] if the columns differ in length.
    pub fn from_initial(initial: &InitialData) -> StorageResult<Self> {
        let len = initial.validate()?;
        let mut data = Self::with_columns(initial.columns.keys().cloned());
        for index in 0..len {
            let cells = initial
                .columns
                .iter()
                .map(|(name, values)| (name.clone(), values[index].clone()))
                .collect();
            data.rows.insert(RowId::new(index as u64 + 1), cells);
        }
        Ok(data)
    }

    /// Appends a row with the next free id and returns that id.
    ///
    /// Columns missing from `cells` are stored as NULL.
    pub fn push_row(&mut self, mut cells: BTreeMap<String, Value>) -> RowId {
        let id = RowId::new(self.rows.keys().next_back().map_or(0, |r| r.as_u64()) + 1);
        let row = self
            .columns
            .iter()
            .map(|c| (c.clone(), cells.remove(c).unwrap_or(Value::Null)))
            .collect();
        self.rows.insert(id, row);
        id
    }

    /// Returns the value at `(column, row)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the row or column does not exist.
    pub fn get(&self, column: &str, row: RowId) -> StorageResult<&Value> {
        self.check_column(column)?;
        self.rows
            .get(&row)
            .ok_or(StorageError::RowNotFound { row })?
            .get(column)
            .ok_or_else(|| StorageError::ColumnNotFound {
                column: column.to_string(),
            })
    }

    /// Sets the value at `(column, row)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the row or column does not exist.
    pub fn set(&mut self, column: &str, row: RowId, value: Value) -> StorageResult<()> {
        self.check_column(column)?;
        let cells = self
            .rows
            .get_mut(&row)
            .ok_or(StorageError::RowNotFound { row })?;
        cells.insert(column.to_string(), value);
        Ok(())
    }

    /// Returns the column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Iterates rows in id order.
    pub fn rows(&self) -> impl Iterator<Item = (RowId, &BTreeMap<String, Value>)> {
        self.rows.iter().map(|(id, cells)| (*id, cells))
    }

    fn check_column(&self, column: &str) -> StorageResult<()> {
        if self.columns.iter().any(|c| c == column) {
            Ok(())
        } else {
            Err(StorageError::ColumnNotFound {
                column: column.to_string(),
            })
        }
    }
}
