use csv::StringRecord;
use std::collections::HashSet;

use crate::constants::{EMAIL_SLOT, MIN_MAPPED_COLUMNS};
use crate::core::error::MappingError;
use crate::core::record::CandidateRecord;
use crate::storage::{Identifier, TargetTable};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPair {
    pub source: String,
    pub target: Identifier,
}

/// Ordered source-header to target-column mapping.
///
/// Position matters: the first three pairs are the given name, family name and
/// email, and the email's target column is the unique key used for duplicate
/// checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pairs: Vec<ColumnPair>,
}

impl ColumnMapping {
    pub fn new<I, S, T>(pairs: I) -> Result<Self, MappingError>
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: AsRef<str>,
    {
        let mut seen_sources = HashSet::new();
        let mut seen_targets = HashSet::new();
        let mut mapped = Vec::new();

        for (source, target) in pairs {
            let source = source.into();
            let target = Identifier::parse(target.as_ref())?;

            if !seen_sources.insert(source.clone()) {
                return Err(MappingError::DuplicateSource(source));
            }
            if !seen_targets.insert(target.clone()) {
                return Err(MappingError::DuplicateTarget(target.to_string()));
            }

            mapped.push(ColumnPair { source, target });
        }

        if mapped.len() < MIN_MAPPED_COLUMNS {
            return Err(MappingError::TooFewColumns {
                required: MIN_MAPPED_COLUMNS,
                actual: mapped.len(),
            });
        }

        Ok(Self { pairs: mapped })
    }

    pub fn pairs(&self) -> &[ColumnPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn key_column(&self) -> &Identifier {
        &self.pairs[EMAIL_SLOT].target
    }

    pub fn target_table(&self, table: Identifier) -> TargetTable {
        TargetTable {
            name: table,
            columns: self.pairs.iter().map(|pair| pair.target.clone()).collect(),
            key_column: self.key_column().clone(),
        }
    }

    /// Find every mapped source column in the header. The first matching
    /// header position wins.
    pub fn resolve(&self, header: &StringRecord) -> Result<ResolvedColumns, MappingError> {
        let indices = self
            .pairs
            .iter()
            .map(|pair| {
                header
                    .iter()
                    .position(|name| name == pair.source)
                    .ok_or_else(|| MappingError::MissingColumn(pair.source.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ResolvedColumns { indices })
    }
}

/// Header positions of the mapped columns, in mapping order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    indices: Vec<usize>,
}

impl ResolvedColumns {
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Pull the mapped fields out of a row. Ragged rows are fine: a field past
    /// the end of the row comes back as `None`.
    pub fn extract(&self, row: &StringRecord) -> CandidateRecord {
        let values = self
            .indices
            .iter()
            .map(|&idx| row.get(idx).map(str::to_string))
            .collect();
        CandidateRecord::from_values(values)
    }
}
