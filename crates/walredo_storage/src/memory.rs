//! In-memory table store for testing.

use crate::error::StorageResult;
use crate::seed::InitialData;
use crate::table::{RowId, TableData, TableStore};
use crate::value::Value;
use parking_lot::RwLock;

/// An in-memory table store.
///
/// This store keeps the whole table in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Dry runs that must not touch a file
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use walredo_storage::{InMemoryTable, RowId, TableData, TableStore, Value};
///
/// let mut data = TableData::with_columns(["A"]);
/// data.push_row(Default::default());
/// let mut table = InMemoryTable::with_data(data);
/// table.write("A", RowId::new(1), Value::Integer(3)).unwrap();
/// assert_eq!(table.read("A", RowId::new(1)).unwrap(), Value::Integer(3));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryTable {
    data: RwLock<TableData>,
    writes: RwLock<usize>,
}

impl InMemoryTable {
    /// Creates a new empty table with no columns.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table with pre-existing contents.
    ///
    /// Useful for testing recovery scenarios.
    #[must_use]
    pub fn with_data(data: TableData) -> Self {
        Self {
            data: RwLock::new(data),
            writes: RwLock::new(0),
        }
    }

    /// Creates a table seeded from initial data.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial data columns are uneven.
    pub fn from_initial(initial: &InitialData) -> StorageResult<Self> {
        Ok(Self::with_data(TableData::from_initial(initial)?))
    }

    /// Returns how many successful writes this table has received.
    ///
    /// Seeding does not count.
    #[must_use]
    pub fn write_count(&self) -> usize {
        *self.writes.read()
    }
}

impl TableStore for InMemoryTable {
    fn read(&self, column: &str, row: RowId) -> StorageResult<Value> {
        self.data.read().get(column, row).cloned()
    }

    fn write(&mut self, column: &str, row: RowId, value: Value) -> StorageResult<()> {
        self.data.write().set(column, row, value)?;
        *self.writes.write() += 1;
        Ok(())
    }

    fn seed(&mut self, initial: &InitialData) -> StorageResult<()> {
        *self.data.write() = TableData::from_initial(initial)?;
        Ok(())
    }

    fn snapshot(&self) -> TableData {
        self.data.read().clone()
    }

    fn flush(&mut self) -> StorageResult<()> {
        // Nothing is pending in memory
        Ok(())
    }
}
