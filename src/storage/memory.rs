use std::collections::{BTreeMap, HashMap, HashSet};

use super::{Identifier, Storage, StorageError, StorageTransaction, TargetTable};

type Row = BTreeMap<String, Option<String>>;

/// In-memory backend for tests and previews.
///
/// Tables are created on first insert. Key columns are treated as unique.
/// Individual keys can be rigged to fail lookups or inserts so callers can
/// exercise storage-error paths without a real database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: HashMap<String, Vec<Row>>,
    failing_lookups: HashSet<String>,
    failing_inserts: HashSet<String>,
    fail_begin: bool,
    fail_commit: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a committed row, bypassing any transaction.
    pub fn seed(&mut self, table: &str, row: &[(&str, &str)]) {
        let row = row
            .iter()
            .map(|(column, value)| (column.to_string(), Some(value.to_string())))
            .collect();
        self.tables.entry(table.to_string()).or_default().push(row);
    }

    pub fn with_failing_lookup(mut self, key: &str) -> Self {
        self.failing_lookups.insert(key.to_string());
        self
    }

    pub fn with_failing_insert(mut self, key: &str) -> Self {
        self.failing_inserts.insert(key.to_string());
        self
    }

    pub fn with_failing_begin(mut self) -> Self {
        self.fail_begin = true;
        self
    }

    pub fn with_failing_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    pub fn rows(&self, table: &str) -> &[Row] {
        self.tables.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.rows(table).len()
    }

    /// Values of `column` across the committed rows of `table`, in insert order.
    pub fn column_values(&self, table: &str, column: &str) -> Vec<Option<String>> {
        self.rows(table)
            .iter()
            .map(|row| row.get(column).cloned().flatten())
            .collect()
    }
}

impl Storage for MemoryStore {
    type Tx<'a> = MemoryTransaction<'a>;

    fn begin(&mut self) -> Result<Self::Tx<'_>, StorageError> {
        if self.fail_begin {
            return Err(StorageError::Backend("cannot begin transaction".to_string()));
        }
        Ok(MemoryTransaction {
            store: self,
            staged: Vec::new(),
        })
    }
}

/// Writes are staged until commit and are visible to later lookups in the
/// same transaction.
pub struct MemoryTransaction<'a> {
    store: &'a mut MemoryStore,
    staged: Vec<(String, Row)>,
}

impl MemoryTransaction<'_> {
    fn visible_rows<'s>(&'s self, table: &'s Identifier) -> impl Iterator<Item = &'s Row> + 's {
        self.store.rows(table.as_str()).iter().chain(
            self.staged
                .iter()
                .filter(move |(name, _)| name == table.as_str())
                .map(|(_, row)| row),
        )
    }

    fn contains_key(&self, target: &TargetTable, key: &str) -> bool {
        let column = target.key_column.as_str();
        self.visible_rows(&target.name)
            .any(|row| matches!(row.get(column), Some(Some(value)) if value == key))
    }
}

impl StorageTransaction for MemoryTransaction<'_> {
    fn key_exists(&mut self, target: &TargetTable, key: &str) -> Result<bool, StorageError> {
        if self.store.failing_lookups.contains(key) {
            return Err(StorageError::Backend(format!("lookup failed for '{}'", key)));
        }
        Ok(self.contains_key(target, key))
    }

    fn insert(&mut self, target: &TargetTable, values: &[Option<String>]) -> Result<(), StorageError> {
        if values.len() != target.columns.len() {
            return Err(StorageError::Backend(format!(
                "expected {} values for {}, got {}",
                target.columns.len(),
                target.name,
                values.len()
            )));
        }

        let row: Row = target
            .columns
            .iter()
            .map(Identifier::as_str)
            .map(str::to_string)
            .zip(values.iter().cloned())
            .collect();

        let key = row
            .get(target.key_column.as_str())
            .cloned()
            .flatten()
            .unwrap_or_default();

        if self.store.failing_inserts.contains(&key) {
            return Err(StorageError::Backend(format!("insert failed for '{}'", key)));
        }
        if self.contains_key(target, &key) {
            return Err(StorageError::UniqueViolation {
                table: target.name.to_string(),
                column: target.key_column.to_string(),
                value: key,
            });
        }

        self.staged.push((target.name.to_string(), row));
        Ok(())
    }

    fn commit(self) -> Result<(), StorageError> {
        if self.store.fail_commit {
            return Err(StorageError::Backend("commit failed".to_string()));
        }
        for (table, row) in self.staged {
            self.store.tables.entry(table).or_default().push(row);
        }
        Ok(())
    }

    fn rollback(self) -> Result<(), StorageError> {
        Ok(())
    }
}
