use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Declared kind of a column, inferred at ingestion or set explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    Numeric,
    Temporal,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Text => "text",
            ColumnKind::Numeric => "numeric",
            ColumnKind::Temporal => "temporal",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "string" => Ok(ColumnKind::Text),
            "numeric" | "number" => Ok(ColumnKind::Numeric),
            "temporal" | "timestamp" | "date" => Ok(ColumnKind::Temporal),
            other => Err(Error::InvalidTable(format!("unknown column kind '{other}'"))),
        }
    }
}

/// A single table cell.
///
/// `Number(NaN)` is the numeric column's native absent marker and is treated
/// as absent everywhere, alongside `Absent`.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Absent,
    Text(String),
    Number(f64),
    Temporal(NaiveDateTime),
}

impl Cell {
    pub fn is_absent(&self) -> bool {
        match self {
            Cell::Absent => true,
            Cell::Number(value) => value.is_nan(),
            _ => false,
        }
    }

    /// Render the cell for display and pattern matching; `None` when absent.
    pub fn render(&self) -> Option<String> {
        match self {
            Cell::Text(value) => Some(value.clone()),
            Cell::Number(value) if !value.is_nan() => Some(render_number(*value)),
            Cell::Temporal(value) => Some(render_temporal(value)),
            _ => None,
        }
    }
}

fn render_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn render_temporal(value: &NaiveDateTime) -> String {
    if value.time() == NaiveTime::MIN {
        value.format("%Y-%m-%d").to_string()
    } else {
        value.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// A named column of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            kind,
            cells,
        }
    }

    pub fn absent_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_absent()).count()
    }
}

/// Ordered set of equally long columns. Rows are addressed by 0-based index.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    lookup: HashMap<String, usize>,
    row_count: usize,
}

impl Table {
    /// Build a table, enforcing equal column lengths and unique names.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map(|col| col.cells.len()).unwrap_or(0);
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(Error::InvalidTable(format!(
                    "duplicate column name: {}",
                    column.name
                )));
            }
            if column.cells.len() != row_count {
                return Err(Error::InvalidTable(format!(
                    "column '{}' has {} rows, expected {}",
                    column.name,
                    column.cells.len(),
                    row_count
                )));
            }
        }
        Ok(Self::from_parts(columns, row_count))
    }

    /// Rebuild from columns already known to satisfy the invariants.
    pub(crate) fn from_parts(columns: Vec<Column>, row_count: usize) -> Self {
        let lookup = columns
            .iter()
            .enumerate()
            .map(|(idx, col)| (col.name.clone(), idx))
            .collect();
        Self {
            columns,
            lookup,
            row_count,
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn cell_count(&self) -> usize {
        self.row_count * self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|col| col.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.lookup.get(name).map(|idx| &self.columns[*idx])
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.lookup.contains_key(name)
    }

    pub fn absent_count(&self) -> usize {
        self.columns.iter().map(Column::absent_count).sum()
    }

    /// Rendered values of one row in column order; `None` for absent cells.
    pub fn render_row(&self, row: usize) -> Vec<Option<String>> {
        self.columns
            .iter()
            .map(|col| col.cells.get(row).and_then(Cell::render))
            .collect()
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(values: &[&str]) -> Vec<Cell> {
        values.iter().map(|v| Cell::Text(v.to_string())).collect()
    }

    #[test]
    fn rejects_unequal_columns() {
        let err = Table::new(vec![
            Column::new("a", ColumnKind::Text, text(&["x", "y"])),
            Column::new("b", ColumnKind::Text, text(&["x"])),
        ])
        .expect_err("unequal columns");
        assert!(err.to_string().contains("column 'b' has 1 rows"));
    }

    #[test]
    fn rejects_duplicate_names() {
        let result = Table::new(vec![
            Column::new("a", ColumnKind::Text, text(&["x"])),
            Column::new("a", ColumnKind::Text, text(&["y"])),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn nan_counts_as_absent() {
        let table = Table::new(vec![Column::new(
            "n",
            ColumnKind::Numeric,
            vec![Cell::Number(1.0), Cell::Number(f64::NAN), Cell::Absent],
        )])
        .expect("table");
        assert_eq!(table.absent_count(), 2);
        assert_eq!(table.cell_count(), 3);
    }

    #[test]
    fn renders_integral_numbers_without_fraction() {
        assert_eq!(Cell::Number(1012345678.0).render().as_deref(), Some("1012345678"));
        assert_eq!(Cell::Number(2.5).render().as_deref(), Some("2.5"));
        assert_eq!(Cell::Number(f64::NAN).render(), None);
    }

    #[test]
    fn parses_column_kind_names() {
        assert_eq!("Numeric".parse::<ColumnKind>().ok(), Some(ColumnKind::Numeric));
        assert_eq!("date".parse::<ColumnKind>().ok(), Some(ColumnKind::Temporal));
        assert!("blob".parse::<ColumnKind>().is_err());
    }
}
