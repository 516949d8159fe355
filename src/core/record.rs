use serde::{Deserialize, Serialize};

use crate::constants::MIN_MAPPED_COLUMNS;

/// Field values pulled out of one CSV row, in column-mapping order and not yet
/// validated. `None` means the row was too short to reach that column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub extra: Vec<Option<String>>,
}

impl CandidateRecord {
    /// Build from values in mapping order. The first three slots are the given
    /// name, family name and email; anything after is carried along as-is.
    pub fn from_values(mut values: Vec<Option<String>>) -> Self {
        if values.len() < MIN_MAPPED_COLUMNS {
            values.resize(MIN_MAPPED_COLUMNS, None);
        }
        let extra = values.split_off(MIN_MAPPED_COLUMNS);
        let mut slots = values.into_iter();

        Self {
            name: slots.next().flatten(),
            surname: slots.next().flatten(),
            email: slots.next().flatten(),
            extra,
        }
    }

    pub fn new(name: &str, surname: &str, email: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            surname: Some(surname.to_string()),
            email: Some(email.to_string()),
            extra: Vec::new(),
        }
    }

    /// Email as it will be looked up and stored: trimmed, case untouched.
    pub fn email_key(&self) -> String {
        self.email.as_deref().unwrap_or("").trim().to_string()
    }
}

/// A record that passed validation and is ready to insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub extra: Vec<Option<String>>,
}

impl NormalizedRecord {
    /// Values in column-mapping order, ready to bind to the insert statement.
    pub fn into_values(self) -> Vec<Option<String>> {
        let mut values = Vec::with_capacity(MIN_MAPPED_COLUMNS + self.extra.len());
        values.push(Some(self.name));
        values.push(Some(self.surname));
        values.push(Some(self.email));
        values.extend(self.extra);
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    #[test]
    fn test_from_values_assigns_slots() {
        let record = CandidateRecord::from_values(vec![
            some("jane"),
            some("doe"),
            some("jane@example.com"),
            some("extra"),
        ]);

        assert_eq!(record.name, some("jane"));
        assert_eq!(record.surname, some("doe"));
        assert_eq!(record.email, some("jane@example.com"));
        assert_eq!(record.extra, vec![some("extra")]);
    }

    #[test]
    fn test_from_short_values() {
        let record = CandidateRecord::from_values(vec![some("jane")]);

        assert_eq!(record.name, some("jane"));
        assert_eq!(record.surname, None);
        assert_eq!(record.email, None);
        assert!(record.extra.is_empty());
        assert_eq!(record.email_key(), "");
    }

    #[test]
    fn test_email_key_trims_but_keeps_case() {
        let record = CandidateRecord::new("jane", "doe", "  Jane@Example.COM ");
        assert_eq!(record.email_key(), "Jane@Example.COM");
    }

    #[test]
    fn test_into_values_order() {
        let record = NormalizedRecord {
            name: "Jane".to_string(),
            surname: "Doe".to_string(),
            email: "jane@example.com".to_string(),
            extra: vec![None, some("x")],
        };

        assert_eq!(
            record.into_values(),
            vec![some("Jane"), some("Doe"), some("jane@example.com"), None, some("x")]
        );
    }
}
