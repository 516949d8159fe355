use once_cell::sync::Lazy;
use regex::Regex;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::constants::{
    FORBIDDEN_EMAIL_CHARS, MAX_DOMAIN_LABEL_LENGTH, MAX_EMAIL_LENGTH, MAX_EMAIL_LOCAL_PART_LENGTH,
};
use crate::core::error::ValidationError;
use crate::core::record::{CandidateRecord, NormalizedRecord};

/// Dot-atom local part, then either hostname labels ending in a label that
/// starts with a letter, or a bracketed address literal.
pub static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:(?:[A-Za-z0-9]+(?:-+[A-Za-z0-9]+)*\.)+[A-Za-z][A-Za-z0-9]*(?:-+[A-Za-z0-9]+)*|\[(?P<literal>[^\]]+)\])$",
    )
    .unwrap()
});

/// Validate and cleanse one candidate record.
///
/// The email must be syntactically valid and free of `!` and `'`. On success
/// the given name is title-cased; the family name is title-cased too unless it
/// contains an apostrophe, in which case only its first letter is raised so
/// forms like `O'Hare` survive. The email is trimmed but keeps its case.
pub fn normalize(candidate: CandidateRecord) -> Result<NormalizedRecord, ValidationError> {
    let email = candidate.email_key();
    validate_email(&email)?;

    let name = title_case(candidate.name.as_deref().unwrap_or("").trim());
    let surname = candidate.surname.as_deref().unwrap_or("").trim();
    let surname = if surname.contains('\'') {
        capitalize_first(surname)
    } else {
        title_case(surname)
    };

    let extra = candidate
        .extra
        .into_iter()
        .map(|value| value.map(|v| v.trim().to_string()))
        .collect();

    Ok(NormalizedRecord {
        name,
        surname,
        email,
        extra,
    })
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if !is_valid_email_syntax(email) {
        return Err(ValidationError::InvalidEmail {
            email: email.to_string(),
        });
    }

    if let Some(character) = email.chars().find(|c| FORBIDDEN_EMAIL_CHARS.contains(c)) {
        return Err(ValidationError::ForbiddenCharacter {
            email: email.to_string(),
            character,
        });
    }

    Ok(())
}

pub fn is_valid_email_syntax(email: &str) -> bool {
    if email.len() > MAX_EMAIL_LENGTH {
        return false;
    }

    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    if local.len() > MAX_EMAIL_LOCAL_PART_LENGTH {
        return false;
    }

    let Some(captures) = EMAIL_REGEX.captures(email) else {
        return false;
    };
    match captures.name("literal") {
        Some(literal) => is_valid_address_literal(literal.as_str()),
        None => domain
            .split('.')
            .all(|label| label.len() <= MAX_DOMAIN_LABEL_LENGTH),
    }
}

/// `127.0.0.1` or `IPv6:2001:db8::1`, as found between the brackets.
fn is_valid_address_literal(literal: &str) -> bool {
    match literal.strip_prefix("IPv6:") {
        Some(v6) => v6.parse::<Ipv6Addr>().is_ok(),
        None => literal.parse::<Ipv4Addr>().is_ok(),
    }
}

/// Lower-case everything, then raise the first character.
pub fn title_case(value: &str) -> String {
    capitalize_first(&value.to_lowercase())
}

/// Raise the first character and leave the rest as supplied.
pub fn capitalize_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
