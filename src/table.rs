use std::fmt;

/// A cell as read from the source document, before any schema typing.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Number(f64),
    Text(String),
}

impl RawValue {
    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    /// Blank cells and the usual NA spellings are null. Everything else is
    /// kept as the original text; numbers are only parsed once the column's
    /// type is known.
    pub fn from_cell(cell: &str) -> Self {
        if is_null_token(cell.trim()) {
            return RawValue::Null;
        }
        RawValue::Text(cell.to_string())
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Null => f.write_str("null"),
            RawValue::Number(n) => write!(f, "{n}"),
            RawValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

fn is_null_token(raw: &str) -> bool {
    matches!(
        raw,
        "" | "NA" | "N/A" | "NaN" | "nan" | "-nan" | "null" | "NULL" | "None" | "<NA>"
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<RawValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<RawValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Named columns of equal length. Row order is the source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// Builds a table, padding short columns with nulls so every column
    /// has the same number of rows.
    pub fn new(mut columns: Vec<Column>) -> Self {
        let rows = columns.iter().map(|c| c.values.len()).max().unwrap_or(0);
        for column in &mut columns {
            column.values.resize(rows, RawValue::Null);
        }
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn value(&self, column: &str, row: usize) -> Option<&RawValue> {
        self.column(column)?.values.get(row)
    }

    /// Keeps the rows for which `keep(row_index)` is true, preserving order.
    pub fn retain_rows(&mut self, mut keep: impl FnMut(usize) -> bool) {
        let mask = (0..self.rows).map(&mut keep).collect::<Vec<_>>();
        for column in &mut self.columns {
            let mut idx = 0;
            column.values.retain(|_| {
                let kept = mask[idx];
                idx += 1;
                kept
            });
        }
        self.rows = mask.iter().filter(|kept| **kept).count();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_follow_dataframe_null_rules() {
        assert_eq!(RawValue::from_cell(""), RawValue::Null);
        assert_eq!(RawValue::from_cell("NaN"), RawValue::Null);
        assert_eq!(RawValue::from_cell(" NA "), RawValue::Null);
        assert_eq!(RawValue::from_cell("3.0"), RawValue::Text("3.0".to_string()));
        assert_eq!(RawValue::from_cell("007"), RawValue::Text("007".to_string()));
        assert_eq!(
            RawValue::from_cell("2016-08-13"),
            RawValue::Text("2016-08-13".to_string())
        );
    }

    #[test]
    fn retain_rows_keeps_columns_aligned() {
        let mut table = Table::new(vec![
            Column::new("a", vec![1.0_f64.into(), 2.0_f64.into(), 3.0_f64.into()]),
            Column::new("b", vec!["x".into(), "y".into(), "z".into()]),
        ]);
        table.retain_rows(|row| row != 1);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.value("a", 1), Some(&RawValue::Number(3.0)));
        assert_eq!(table.value("b", 1), Some(&RawValue::Text("z".to_string())));
    }

    #[test]
    fn short_columns_are_padded_with_nulls() {
        let table = Table::new(vec![
            Column::new("a", vec![1.0_f64.into(), 2.0_f64.into()]),
            Column::new("b", vec!["x".into()]),
        ]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.value("b", 1), Some(&RawValue::Null));
    }
}
