use csv::{Reader, ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::core::error::ImportError;
use crate::core::mapping::ColumnMapping;
use crate::core::row_processor::{LookupFailurePolicy, RowProcessor};
use crate::core::stats::RunStatistics;
use crate::storage::{Identifier, Storage, StorageTransaction, TargetTable};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Run everything, then roll back instead of committing.
    pub dry_run: bool,
    pub on_lookup_error: LookupFailurePolicy,
}

/// Drives a whole CSV file into one table inside a single transaction.
///
/// Per-row problems end up in the returned [`RunStatistics`]. Structural
/// problems (missing file, unreadable header, mapping mismatch, storage
/// failure outside a row) roll the transaction back and come back as an
/// [`ImportError`], so nothing from a failed run is ever committed.
pub struct Importer<S> {
    store: S,
    table: Identifier,
    options: ImportOptions,
}

impl<S: Storage> Importer<S> {
    pub fn new(store: S, table: Identifier) -> Self {
        Self {
            store,
            table,
            options: ImportOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn import(
        &mut self,
        source: &Path,
        delimiter: u8,
        mapping: &ColumnMapping,
    ) -> Result<RunStatistics, ImportError> {
        let file = File::open(source).map_err(|e| {
            error!("CSV file not found: {}", source.display());
            ImportError::SourceNotFound {
                path: source.to_path_buf(),
                source: e,
            }
        })?;

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(BufReader::new(file));

        let target = mapping.target_table(self.table.clone());
        let options = self.options;

        info!("Importing {} into table '{}'", source.display(), self.table);
        let mut tx = self.store.begin().map_err(ImportError::TransactionFailed)?;

        match process_rows(&mut tx, &mut reader, source, mapping, &target, options.on_lookup_error) {
            Ok(stats) => {
                let finished = if options.dry_run {
                    info!("Dry run: rolling back {} staged inserts", stats.successful_inserts);
                    tx.rollback()
                } else {
                    tx.commit()
                };
                finished.map_err(|e| {
                    error!("Failed to finish transaction: {}", e);
                    ImportError::TransactionFailed(e)
                })?;

                info!(
                    "Import finished: {} rows, {} inserted, {} failed",
                    stats.total_rows, stats.successful_inserts, stats.failed_inserts
                );
                Ok(stats)
            }
            Err(e) => {
                error!("Import failed: {}", e);
                if let Err(rollback_err) = tx.rollback() {
                    error!("Rollback failed: {}", rollback_err);
                } else {
                    warn!("Transaction rolled back, nothing was committed");
                }
                Err(e)
            }
        }
    }
}

fn process_rows<T: StorageTransaction, R: Read>(
    tx: &mut T,
    reader: &mut Reader<R>,
    source: &Path,
    mapping: &ColumnMapping,
    target: &TargetTable,
    on_lookup_error: LookupFailurePolicy,
) -> Result<RunStatistics, ImportError> {
    let header = match reader.headers() {
        Ok(header) if !header.is_empty() => header.clone(),
        Ok(_) => {
            return Err(ImportError::HeaderUnreadable {
                path: source.to_path_buf(),
                source: None,
            })
        }
        Err(e) => {
            return Err(ImportError::HeaderUnreadable {
                path: source.to_path_buf(),
                source: Some(e),
            })
        }
    };
    debug!("CSV header: {:?}", header);

    let columns = mapping.resolve(&header)?;
    let processor = RowProcessor::new(&columns, target, on_lookup_error);

    let mut stats = RunStatistics::default();
    let mut row = StringRecord::new();

    loop {
        match reader.read_record(&mut row) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                return Err(ImportError::RowUnreadable {
                    row: stats.total_rows + 1,
                    source: e,
                })
            }
        }

        let row_number = stats.begin_row();
        let outcome = processor
            .process(row_number, &row, tx)
            .map_err(|e| ImportError::DuplicateCheckFailed {
                row: row_number,
                source: e,
            })?;
        stats.record(row_number, &outcome);
    }

    Ok(stats)
}
