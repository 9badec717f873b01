use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

/// Type a raw match column is coerced into before records are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Date,
    Text,
    Integer,
    Float,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FieldType::Date => "date",
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("unknown match field {0:?}")]
    UnknownField(String),
    #[error("match field {0:?} is declared more than once")]
    DuplicateField(String),
    #[error("match field {0:?} has no declared type")]
    MissingType(String),
    #[error("match field type {0:?} has no matching field name")]
    UntypedName(String),
}

pub const FIELD_COUNT: usize = 14;

/// Canonical match columns, in the order they are projected and stored.
pub const MATCH_FIELDS: [&str; FIELD_COUNT] = [
    "date",
    "league",
    "season",
    "team1",
    "team2",
    "spi1",
    "spi2",
    "prob1",
    "prob2",
    "probtie",
    "proj_score1",
    "proj_score2",
    "score1",
    "score2",
];

pub const MATCH_FIELD_TYPES: [(&str, FieldType); FIELD_COUNT] = [
    ("date", FieldType::Date),
    ("league", FieldType::Text),
    ("season", FieldType::Integer),
    ("team1", FieldType::Text),
    ("team2", FieldType::Text),
    ("spi1", FieldType::Float),
    ("spi2", FieldType::Float),
    ("prob1", FieldType::Float),
    ("prob2", FieldType::Float),
    ("probtie", FieldType::Float),
    ("proj_score1", FieldType::Float),
    ("proj_score2", FieldType::Float),
    ("score1", FieldType::Integer),
    ("score2", FieldType::Integer),
];

/// Fields allowed to be null in a stored match. A match with both set is finished.
pub const NULLABLE_FIELDS: [&str; 2] = ["score1", "score2"];

pub const SCORE_FIELDS: (&str, &str) = ("score1", "score2");

pub fn type_of(field: &str) -> Result<FieldType, SchemaError> {
    MATCH_FIELD_TYPES
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, ty)| *ty)
        .ok_or_else(|| SchemaError::UnknownField(field.to_string()))
}

pub fn is_nullable(field: &str) -> bool {
    NULLABLE_FIELDS.contains(&field)
}

/// Checks that the name list and the type list describe the same field set.
pub fn validate() -> Result<(), SchemaError> {
    validate_tables(&MATCH_FIELDS, &MATCH_FIELD_TYPES)
}

fn validate_tables(names: &[&str], types: &[(&str, FieldType)]) -> Result<(), SchemaError> {
    let mut seen_names = HashSet::new();
    for name in names {
        if !seen_names.insert(*name) {
            return Err(SchemaError::DuplicateField(name.to_string()));
        }
    }

    let mut seen_types = HashSet::new();
    for (name, _) in types {
        if !seen_types.insert(*name) {
            return Err(SchemaError::DuplicateField(name.to_string()));
        }
        if !seen_names.contains(name) {
            return Err(SchemaError::UntypedName(name.to_string()));
        }
    }

    if let Some(missing) = names.iter().find(|name| !seen_types.contains(*name)) {
        return Err(SchemaError::MissingType(missing.to_string()));
    }
    Ok(())
}
