pub mod memory;
pub mod sqlite;

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use thiserror::Error;

use crate::constants::MAX_IDENTIFIER_LENGTH;
use crate::core::error::MappingError;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

pub static IDENTIFIER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap()
});

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("unique constraint violated on {table}.{column} for '{value}'")]
    UniqueViolation {
        table: String,
        column: String,
        value: String,
    },

    #[error("table '{0}' does not exist")]
    UnknownTable(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// A table or column name that is safe to splice into a statement.
///
/// Only values are ever bound as parameters, so every name that ends up in SQL
/// text has to pass through here first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    pub fn parse(name: &str) -> Result<Self, MappingError> {
        if name.len() > MAX_IDENTIFIER_LENGTH || !IDENTIFIER_REGEX.is_match(name) {
            return Err(MappingError::InvalidIdentifier(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where normalized records go: the table, the insert column list in mapping
/// order, and the column holding the unique key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetTable {
    pub name: Identifier,
    pub columns: Vec<Identifier>,
    pub key_column: Identifier,
}

impl TargetTable {
    pub fn insert_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(Identifier::quoted)
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=self.columns.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.name.quoted(),
            columns,
            placeholders
        )
    }

    /// The key column's value among `values`, which line up with `columns`.
    pub fn key_value<'v>(&self, values: &'v [Option<String>]) -> Option<&'v str> {
        let index = self.columns.iter().position(|c| *c == self.key_column)?;
        values.get(index)?.as_deref()
    }

    pub fn exists_sql(&self) -> String {
        format!(
            "SELECT 1 FROM {} WHERE {} = ?1 LIMIT 1",
            self.name.quoted(),
            self.key_column.quoted()
        )
    }
}

/// A relational backend able to open a transaction.
pub trait Storage {
    type Tx<'a>: StorageTransaction
    where
        Self: 'a;

    fn begin(&mut self) -> Result<Self::Tx<'_>, StorageError>;
}

/// An open transaction. Dropping it without calling `commit` discards every
/// write made through it.
pub trait StorageTransaction {
    /// True iff a row whose key column equals `key` exactly is visible to
    /// this transaction.
    fn key_exists(&mut self, target: &TargetTable, key: &str) -> Result<bool, StorageError>;

    /// Insert one row; `values` line up with `target.columns`.
    fn insert(&mut self, target: &TargetTable, values: &[Option<String>]) -> Result<(), StorageError>;

    fn commit(self) -> Result<(), StorageError>;

    fn rollback(self) -> Result<(), StorageError>;
}
