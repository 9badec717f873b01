use std::fmt;

use chrono::NaiveDate;
use log::debug;

use crate::error::IngestError;
use crate::pipeline::Step;
use crate::record::MatchRecord;
use crate::schema::{self, FieldType, SCORE_FIELDS};
use crate::table::{RawValue, Table};

/// Which matches an ingest run keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IngestMode {
    /// Only matches with both scores present.
    #[default]
    Finished,
    /// Every complete row, played or not.
    All,
}

impl IngestMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "finished" => Some(IngestMode::Finished),
            "all" => Some(IngestMode::All),
            _ => None,
        }
    }
}

impl fmt::Display for IngestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestMode::Finished => f.write_str("finished"),
            IngestMode::All => f.write_str("all"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Null,
    Date(NaiveDate),
    Text(String),
    Integer(i64),
    Float(f64),
}

impl TypedValue {
    pub fn field_type(&self) -> Option<FieldType> {
        match self {
            TypedValue::Null => None,
            TypedValue::Date(_) => Some(FieldType::Date),
            TypedValue::Text(_) => Some(FieldType::Text),
            TypedValue::Integer(_) => Some(FieldType::Integer),
            TypedValue::Float(_) => Some(FieldType::Float),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedColumn {
    pub name: String,
    pub field_type: FieldType,
    pub values: Vec<TypedValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedTable {
    columns: Vec<TypedColumn>,
    rows: usize,
}

impl TypedTable {
    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> &[TypedColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&TypedColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn get(&self, field: &str, row: usize) -> Result<&TypedValue, IngestError> {
        self.column(field)
            .and_then(|c| c.values.get(row))
            .ok_or_else(|| IngestError::FieldsNotFound(vec![field.to_string()]))
    }

    fn date(&self, field: &str, row: usize) -> Result<NaiveDate, IngestError> {
        match self.get(field, row)? {
            TypedValue::Date(d) => Ok(*d),
            other => Err(mismatch(field, row, other, FieldType::Date)),
        }
    }

    fn text(&self, field: &str, row: usize) -> Result<String, IngestError> {
        match self.get(field, row)? {
            TypedValue::Text(s) => Ok(s.clone()),
            other => Err(mismatch(field, row, other, FieldType::Text)),
        }
    }

    fn integer(&self, field: &str, row: usize) -> Result<i64, IngestError> {
        self.opt_integer(field, row)?
            .ok_or_else(|| mismatch(field, row, &TypedValue::Null, FieldType::Integer))
    }

    fn opt_integer(&self, field: &str, row: usize) -> Result<Option<i64>, IngestError> {
        match self.get(field, row)? {
            TypedValue::Integer(n) => Ok(Some(*n)),
            TypedValue::Null => Ok(None),
            other => Err(mismatch(field, row, other, FieldType::Integer)),
        }
    }

    fn float(&self, field: &str, row: usize) -> Result<f64, IngestError> {
        match self.get(field, row)? {
            TypedValue::Float(n) => Ok(*n),
            other => Err(mismatch(field, row, other, FieldType::Float)),
        }
    }
}

fn mismatch(field: &str, row: usize, value: &TypedValue, expected: FieldType) -> IngestError {
    IngestError::TypeCoercion {
        field: field.to_string(),
        row,
        value: format!("{value:?}"),
        expected,
    }
}

/// Keeps rows where both score cells are present. Returns the number dropped.
pub fn filter_finished(table: &mut Table) -> usize {
    let before = table.row_count();
    let (home, away) = SCORE_FIELDS;
    let finished = (0..before)
        .map(|row| {
            let present = |field| table.value(field, row).is_some_and(|v| !v.is_null());
            present(home) && present(away)
        })
        .collect::<Vec<_>>();
    table.retain_rows(|row| finished[row]);
    let dropped = before - table.row_count();
    debug!("finished filter dropped {dropped} of {before} rows");
    dropped
}

/// Drops rows with a null in any required column. Nullable score columns
/// are exempt; after [`filter_finished`] they hold no nulls anyway.
pub fn drop_missing(table: &mut Table) -> usize {
    let before = table.row_count();
    let required = table
        .columns()
        .iter()
        .filter(|c| !schema::is_nullable(&c.name))
        .collect::<Vec<_>>();
    let complete = (0..before)
        .map(|row| required.iter().all(|c| !c.values[row].is_null()))
        .collect::<Vec<_>>();
    table.retain_rows(|row| complete[row]);
    let dropped = before - table.row_count();
    debug!("missing-value drop removed {dropped} of {before} rows");
    dropped
}

/// Casts every column to its registry type. Nothing is defaulted: a value
/// that does not fit its type fails the whole table.
pub fn coerce(table: &Table) -> Result<TypedTable, IngestError> {
    let mut columns = Vec::with_capacity(table.columns().len());
    for column in table.columns() {
        let field_type = schema::type_of(&column.name)?;
        let nullable = schema::is_nullable(&column.name);
        let values = column
            .values
            .iter()
            .enumerate()
            .map(|(row, value)| {
                coerce_value(value, field_type, nullable).ok_or_else(|| {
                    IngestError::TypeCoercion {
                        field: column.name.clone(),
                        row,
                        value: value.to_string(),
                        expected: field_type,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        columns.push(TypedColumn {
            name: column.name.clone(),
            field_type,
            values,
        });
    }
    Ok(TypedTable {
        columns,
        rows: table.row_count(),
    })
}

fn coerce_value(value: &RawValue, ty: FieldType, nullable: bool) -> Option<TypedValue> {
    match (value, ty) {
        (RawValue::Null, _) => nullable.then_some(TypedValue::Null),
        (RawValue::Text(s), FieldType::Date) => parse_date(s).map(TypedValue::Date),
        (RawValue::Number(_), FieldType::Date) => None,
        (RawValue::Text(s), FieldType::Text) => Some(TypedValue::Text(s.clone())),
        (RawValue::Number(n), FieldType::Text) => Some(TypedValue::Text(n.to_string())),
        (RawValue::Number(n), FieldType::Integer) => integral(*n).map(TypedValue::Integer),
        (RawValue::Text(s), FieldType::Integer) => parse_integer(s).map(TypedValue::Integer),
        (RawValue::Number(n), FieldType::Float) => Some(TypedValue::Float(*n)),
        (RawValue::Text(s), FieldType::Float) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(TypedValue::Float),
    }
}

/// Largest magnitude below which every integer is exact in an f64.
const F64_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// `n` as i64 when it is a whole number inside the i64 range.
fn integral(n: f64) -> Option<i64> {
    // i64::MIN is -2^63 exactly; 2^63 itself is already out of range.
    let bound = -(i64::MIN as f64);
    if !n.is_finite() || n.fract() != 0.0 || n < -bound || n >= bound {
        return None;
    }
    Some(n as i64)
}

/// Integer text parses as i64 directly. A float spelling such as `3.0` is
/// accepted only when it names that integer exactly.
fn parse_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(n);
    }
    if trimmed.bytes().all(|b| b.is_ascii_digit() || b == b'-' || b == b'+') {
        return None;
    }
    let n = trimmed.parse::<f64>().ok()?;
    if n.abs() >= F64_EXACT_INT {
        return None;
    }
    integral(n)
}

/// `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let (date, rest) = NaiveDate::parse_and_remainder(raw.trim(), "%Y-%m-%d").ok()?;
    if rest.is_empty() || rest.starts_with(' ') || rest.starts_with('T') {
        Some(date)
    } else {
        None
    }
}

/// Builds one record per row, in row order.
pub fn materialize(typed: &TypedTable) -> Result<Vec<MatchRecord>, IngestError> {
    let (home, away) = SCORE_FIELDS;
    let mut out = Vec::with_capacity(typed.row_count());
    for row in 0..typed.row_count() {
        out.push(MatchRecord {
            date: typed.date("date", row)?,
            league: typed.text("league", row)?,
            season: typed.integer("season", row)?,
            team1: typed.text("team1", row)?,
            team2: typed.text("team2", row)?,
            spi1: typed.float("spi1", row)?,
            spi2: typed.float("spi2", row)?,
            prob1: typed.float("prob1", row)?,
            prob2: typed.float("prob2", row)?,
            probtie: typed.float("probtie", row)?,
            proj_score1: typed.float("proj_score1", row)?,
            proj_score2: typed.float("proj_score2", row)?,
            score1: typed.opt_integer(home, row)?,
            score2: typed.opt_integer(away, row)?,
        });
    }
    Ok(out)
}

#[derive(Debug, Clone)]
pub struct Transformed {
    pub records: Vec<MatchRecord>,
    pub rows_after_filter: usize,
    pub rows_after_drop: usize,
}

/// Runs the filter, drop, coerce and materialize steps over a projected
/// table, reporting each step before it starts.
pub fn transform_reporting(
    mut table: Table,
    mode: IngestMode,
    progress: &mut dyn FnMut(Step),
) -> Result<Transformed, IngestError> {
    if mode == IngestMode::Finished {
        progress(Step::FilteringFinished);
        filter_finished(&mut table);
    }
    let rows_after_filter = table.row_count();

    progress(Step::DroppingMissing);
    drop_missing(&mut table);
    let rows_after_drop = table.row_count();

    progress(Step::SettingTypes);
    let typed = coerce(&table)?;

    progress(Step::GeneratingRecords);
    let records = materialize(&typed)?;
    Ok(Transformed {
        records,
        rows_after_filter,
        rows_after_drop,
    })
}

/// [`transform_reporting`] without progress output.
pub fn transform(table: Table, mode: IngestMode) -> Result<Vec<MatchRecord>, IngestError> {
    transform_reporting(table, mode, &mut |_| {}).map(|t| t.records)
}
