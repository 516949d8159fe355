use serde::{Deserialize, Serialize};

use crate::core::row_processor::RowOutcome;

/// Counters and row-tagged error messages for one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub total_rows: usize,
    pub successful_inserts: usize,
    pub failed_inserts: usize,
    pub errors: Vec<String>,
}

impl RunStatistics {
    /// Count a data row and return its 1-based number.
    pub fn begin_row(&mut self) -> usize {
        self.total_rows += 1;
        self.total_rows
    }

    pub fn record(&mut self, row_number: usize, outcome: &RowOutcome) {
        match outcome.reason() {
            None => self.successful_inserts += 1,
            Some(reason) => {
                self.failed_inserts += 1;
                self.errors.push(format!("Row {}: {}", row_number, reason));
            }
        }
    }

    pub fn is_balanced(&self) -> bool {
        self.total_rows == self.successful_inserts + self.failed_inserts
    }
}
