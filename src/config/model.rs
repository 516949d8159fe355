use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DATABASE_PATH, DEFAULT_DELIMITER, DEFAULT_TABLE_NAME, DEFAULT_VERBOSITY, EMAIL_COLUMN,
    NAME_COLUMN, SURNAME_COLUMN,
};
use crate::core::importer::ImportOptions;
use crate::core::mapping::ColumnMapping;
use crate::core::row_processor::LookupFailurePolicy;
use crate::storage::Identifier;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub import: ImportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    pub table: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    pub columns: Vec<ColumnConfig>,
    #[serde(default)]
    pub on_lookup_error: LookupFailurePolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub verbosity: String,
    #[serde(default)]
    pub log_file: String,
}

fn default_delimiter() -> char {
    DEFAULT_DELIMITER
}

impl Default for Config {
    fn default() -> Self {
        let columns = [NAME_COLUMN, SURNAME_COLUMN, EMAIL_COLUMN]
            .iter()
            .map(|column| ColumnConfig {
                source: column.to_string(),
                target: column.to_string(),
            })
            .collect();

        Self {
            database: DatabaseConfig {
                path: DEFAULT_DATABASE_PATH.to_string(),
            },
            import: ImportConfig {
                table: DEFAULT_TABLE_NAME.to_string(),
                delimiter: DEFAULT_DELIMITER,
                columns,
                on_lookup_error: LookupFailurePolicy::default(),
            },
            logging: LoggingConfig {
                verbosity: DEFAULT_VERBOSITY.to_string(),
                log_file: String::new(),
            },
        }
    }
}

impl ImportConfig {
    pub fn table_identifier(&self) -> Result<Identifier> {
        Ok(Identifier::parse(&self.table)?)
    }

    pub fn column_mapping(&self) -> Result<ColumnMapping> {
        let pairs = self
            .columns
            .iter()
            .map(|column| (column.source.clone(), column.target.as_str()));
        Ok(ColumnMapping::new(pairs)?)
    }

    /// The delimiter as the single byte the CSV reader wants.
    pub fn delimiter_byte(&self) -> Result<u8> {
        if !self.delimiter.is_ascii() || matches!(self.delimiter, '"' | '\n' | '\r') {
            anyhow::bail!("delimiter must be a single ASCII character other than a quote or newline");
        }
        Ok(self.delimiter as u8)
    }

    pub fn options(&self, dry_run: bool) -> ImportOptions {
        ImportOptions {
            dry_run,
            on_lookup_error: self.on_lookup_error,
        }
    }
}
