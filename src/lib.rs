// Import pipeline: normalize, de-duplicate and insert CSV rows in one transaction
pub mod core;

// Storage backends and the transaction seam
pub mod storage;

pub mod config;
pub mod constants;
pub mod utils;

// Re-export main types for convenience
pub use crate::config::{Config, ConfigSource};
pub use crate::core::error::{ImportError, MappingError, ValidationError};
pub use crate::core::importer::{ImportOptions, Importer};
pub use crate::core::mapping::ColumnMapping;
pub use crate::core::row_processor::{LookupFailurePolicy, RowOutcome};
pub use crate::core::stats::RunStatistics;
pub use crate::storage::{Identifier, MemoryStore, SqliteStore, StorageError};
