//! Input sanitizers and field checks applied before anything is sent.

use std::collections::BTreeMap;
use std::fmt;

pub const ROLL_NUMBER_LEN: usize = 8;
pub const PHONE_LEN: usize = 10;

/// Digits only, at most eight of them, upper-cased.
pub fn sanitize_roll_number(input: &str) -> String {
    input
        .chars()
        .filter(char::is_ascii_digit)
        .take(ROLL_NUMBER_LEN)
        .collect::<String>()
        .to_uppercase()
}

pub fn sanitize_phone(input: &str) -> String {
    input
        .chars()
        .filter(char::is_ascii_digit)
        .take(PHONE_LEN)
        .collect()
}

fn all_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_valid_roll_number(value: &str) -> bool {
    all_digits(value, ROLL_NUMBER_LEN)
}

pub fn is_valid_phone(value: &str) -> bool {
    all_digits(value, PHONE_LEN)
}

/// `local@domain.tld`: no whitespace, exactly one `@`, and a dot inside the
/// domain with text on both sides.
pub fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    Name,
    RollNumber,
    Email,
    Phone,
    Department,
    Year,
    DateRange,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Name => "name",
            Field::RollNumber => "rollNumber",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::Department => "department",
            Field::Year => "year",
            Field::DateRange => "dateRange",
        })
    }
}

/// Field-level messages, one per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<Field, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: Field, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: Field, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    #[cfg(test)]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.errors.iter().map(|(field, message)| (*field, message.as_str()))
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (field, message)) in self.errors.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "- {field}: {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
