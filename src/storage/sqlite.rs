use rusqlite::{ffi, params, params_from_iter, Connection, Transaction};
use std::path::Path;
use tracing::{debug, info};

use super::{Identifier, Storage, StorageError, StorageTransaction, TargetTable};

/// SQLite backend. Owns a single connection for the lifetime of a run.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path.as_ref())?;
        debug!("Opened SQLite database at {}", path.as_ref().display());
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn table_exists(&self, table: &Identifier) -> Result<bool, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
        let exists = stmt.exists(params![table.as_str()])?;
        debug!(
            "Table '{}' {}",
            table,
            if exists { "exists" } else { "does not exist" }
        );
        Ok(exists)
    }

    pub fn drop_table(&self, table: &Identifier) -> Result<(), StorageError> {
        self.conn
            .execute(&format!("DROP TABLE IF EXISTS {}", table.quoted()), [])?;
        Ok(())
    }

    /// Rebuild `table` with the users schema, dropping any existing table of
    /// that name first.
    pub fn create_users_table(&self, table: &Identifier) -> Result<(), StorageError> {
        if self.table_exists(table)? {
            self.drop_table(table)?;
            info!("Existing table '{}' was dropped", table);
        }

        self.conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {}(
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name VARCHAR(100) NOT NULL,
                    surname VARCHAR(100) NOT NULL,
                    email VARCHAR(100) NOT NULL UNIQUE,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                )",
                table.quoted()
            ),
            [],
        )?;
        info!("Table '{}' created", table);
        Ok(())
    }

    pub fn row_count(&self, table: &Identifier) -> Result<u64, StorageError> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", table.quoted()),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

impl Storage for SqliteStore {
    type Tx<'a> = SqliteTransaction<'a>;

    fn begin(&mut self) -> Result<Self::Tx<'_>, StorageError> {
        Ok(SqliteTransaction {
            tx: self.conn.transaction()?,
        })
    }
}

/// Wraps a rusqlite transaction; rusqlite rolls back on drop.
pub struct SqliteTransaction<'a> {
    tx: Transaction<'a>,
}

impl StorageTransaction for SqliteTransaction<'_> {
    fn key_exists(&mut self, target: &TargetTable, key: &str) -> Result<bool, StorageError> {
        let mut stmt = self.tx.prepare_cached(&target.exists_sql())?;
        Ok(stmt.exists(params![key])?)
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
        let mut stmt = self.tx.prepare_cached(&target.insert_sql())?;
        stmt.execute(params_from_iter(values.iter()))
            .map_err(|e| insert_error(target, values, e))?;
        Ok(())
    }

    fn commit(self) -> Result<(), StorageError> {
        self.tx.commit()?;
        Ok(())
    }

    fn rollback(self) -> Result<(), StorageError> {
        self.tx.rollback()?;
        Ok(())
    }
}

/// A UNIQUE failure that names the key column becomes
/// [`StorageError::UniqueViolation`]; anything else stays a database error.
fn insert_error(target: &TargetTable, values: &[Option<String>], err: rusqlite::Error) -> StorageError {
    if let rusqlite::Error::SqliteFailure(failure, Some(message)) = &err {
        let key = format!("{}.{}", target.name, target.key_column);
        let names_key = message
            .rsplit(": ")
            .next()
            .is_some_and(|columns| columns.split(", ").any(|c| c == key));

        if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE && names_key {
            return StorageError::UniqueViolation {
                table: target.name.to_string(),
                column: target.key_column.to_string(),
                value: target.key_value(values).unwrap_or_default().to_string(),
            };
        }
    }
    StorageError::Database(err)
}
