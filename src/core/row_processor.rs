use csv::StringRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::error::ValidationError;
use crate::core::mapping::ResolvedColumns;
use crate::core::validation::normalize;
use crate::storage::{StorageError, StorageTransaction, TargetTable};

/// What to do when the duplicate lookup itself fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupFailurePolicy {
    /// Reject the row and keep going.
    #[default]
    RejectRow,
    /// Carry on as if no duplicate exists.
    AssumeAbsent,
    /// Abandon the whole import.
    Abort,
}

#[derive(Debug)]
pub enum RowOutcome {
    Inserted,
    RejectedInvalidEmail(ValidationError),
    RejectedDuplicate { email: String },
    RejectedLookupFailed(StorageError),
    RejectedStorage(StorageError),
}

impl RowOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, RowOutcome::Inserted)
    }

    /// Human-readable rejection reason, `None` for inserted rows.
    pub fn reason(&self) -> Option<String> {
        match self {
            RowOutcome::Inserted => None,
            RowOutcome::RejectedInvalidEmail(e) => Some(e.to_string()),
            RowOutcome::RejectedDuplicate { email } => Some(format!("email '{}' already exists", email)),
            RowOutcome::RejectedLookupFailed(e) => Some(format!("duplicate check failed: {}", e)),
            RowOutcome::RejectedStorage(e) => Some(format!("insert failed: {}", e)),
        }
    }
}

/// Runs one row through normalize, duplicate check and insert.
pub struct RowProcessor<'a> {
    columns: &'a ResolvedColumns,
    target: &'a TargetTable,
    on_lookup_error: LookupFailurePolicy,
}

impl<'a> RowProcessor<'a> {
    pub fn new(
        columns: &'a ResolvedColumns,
        target: &'a TargetTable,
        on_lookup_error: LookupFailurePolicy,
    ) -> Self {
        Self {
            columns,
            target,
            on_lookup_error,
        }
    }

    /// Process a single data row inside `tx`.
    ///
    /// Every per-row problem is returned as a rejected outcome. The only error
    /// is a failed duplicate lookup under [`LookupFailurePolicy::Abort`].
    pub fn process<T: StorageTransaction>(
        &self,
        row_number: usize,
        row: &StringRecord,
        tx: &mut T,
    ) -> Result<RowOutcome, StorageError> {
        let candidate = self.columns.extract(row);
        let lookup_key = candidate.email_key();

        let record = match normalize(candidate) {
            Ok(record) => record,
            Err(e) => {
                warn!("Row {}: not inserted, {}", row_number, e);
                return Ok(RowOutcome::RejectedInvalidEmail(e));
            }
        };

        match tx.key_exists(self.target, &lookup_key) {
            Ok(true) => {
                warn!("Row {}: not inserted, email '{}' already exists", row_number, lookup_key);
                return Ok(RowOutcome::RejectedDuplicate { email: lookup_key });
            }
            Ok(false) => {}
            Err(e) => match self.on_lookup_error {
                LookupFailurePolicy::RejectRow => {
                    warn!("Row {}: duplicate check failed: {}", row_number, e);
                    return Ok(RowOutcome::RejectedLookupFailed(e));
                }
                LookupFailurePolicy::AssumeAbsent => {
                    warn!("Row {}: duplicate check failed, assuming no duplicate: {}", row_number, e);
                }
                LookupFailurePolicy::Abort => return Err(e),
            },
        }

        match tx.insert(self.target, &record.into_values()) {
            Ok(()) => {
                debug!("Row {}: inserted", row_number);
                Ok(RowOutcome::Inserted)
            }
            Err(e) => {
                warn!("Row {}: insert failed: {}", row_number, e);
                Ok(RowOutcome::RejectedStorage(e))
            }
        }
    }
}
