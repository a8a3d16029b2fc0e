//! File-based table store for persistent storage.

use crate::error::StorageResult;
use crate::seed::InitialData;
use crate::table::{RowId, TableData, TableStore};
use crate::value::Value;
use parking_lot::RwLock;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// A file-based table store.
///
/// The table is held in memory and persisted as a single JSON document.
/// Contents survive process restarts once [`TableStore::flush`] returns.
///
/// # Durability
///
/// - `write()` only updates memory and marks the table dirty
/// - `flush()` writes a sibling temporary file, syncs it and renames it
///   over the target, so a crash leaves either the old or the new table
///
/// # Example
///
/// ```no_run
/// use walredo_storage::{FileTable, RowId, TableStore, Value};
/// use std::path::Path;
///
/// let mut table = FileTable::open(Path::new("table.json")).unwrap();
/// table.write("A", RowId::new(1), Value::Integer(10)).unwrap();
/// table.flush().unwrap();
/// ```
#[derive(Debug)]
pub struct FileTable {
    path: PathBuf,
    data: RwLock<TableData>,
    dirty: RwLock<bool>,
}

impl FileTable {
    /// Opens a table file, or starts an empty table if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or decoded.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let data = if path.exists() {
            let json = fs::read_to_string(path)?;
            serde_json::from_str(&json)?
        } else {
            TableData::default()
        };

        Ok(Self {
            path: path.to_path_buf(),
            data: RwLock::new(data),
            dirty: RwLock::new(false),
        })
    }

    /// Opens a table file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file is invalid.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if there are writes not yet flushed.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        *self.dirty.read()
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl TableStore for FileTable {
    fn read(&self, column: &str, row: RowId) -> StorageResult<Value> {
        self.data.read().get(column, row).cloned()
    }

    fn write(&mut self, column: &str, row: RowId, value: Value) -> StorageResult<()> {
        self.data.write().set(column, row, value)?;
        *self.dirty.write() = true;
        Ok(())
    }

    fn seed(&mut self, initial: &InitialData) -> StorageResult<()> {
        *self.data.write() = TableData::from_initial(initial)?;
        *self.dirty.write() = true;
        Ok(())
    }

    fn snapshot(&self) -> TableData {
        self.data.read().clone()
    }

    fn flush(&mut self) -> StorageResult<()> {
        if !self.is_dirty() && self.path.exists() {
            return Ok(());
        }

        let json = serde_json::to_vec_pretty(&*self.data.read())?;
        let temp = self.temp_path();
        if let Err(e) = replace_file(&temp, &self.path, &json) {
            let _ = fs::remove_file(&temp);
            tracing::warn!(path = %self.path.display(), error = %e, "table flush failed");
            return Err(e.into());
        }
        *self.dirty.write() = false;

        tracing::debug!(path = %self.path.display(), bytes = json.len(), "table flushed");
        Ok(())
    }
}

/// Writes `bytes` to `temp`, syncs it and renames it over `target`.
fn replace_file(temp: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(temp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    fs::rename(temp, target)
}
