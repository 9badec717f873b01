use crate::error::IngestError;
use crate::schema::MATCH_FIELDS;
use crate::table::{Column, Table};

/// Selects the canonical match columns in registry order and drops the rest.
///
/// Fails with [`IngestError::FieldsNotFound`] naming every absent field.
pub fn project(table: &Table) -> Result<Table, IngestError> {
    let missing = MATCH_FIELDS
        .iter()
        .filter(|field| table.column(field).is_none())
        .map(|field| field.to_string())
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(IngestError::FieldsNotFound(missing));
    }

    let columns = MATCH_FIELDS
        .iter()
        .filter_map(|field| table.column(field))
        .map(|column| Column::new(column.name.clone(), column.values.clone()))
        .collect::<Vec<_>>();
    Ok(Table::new(columns))
}
