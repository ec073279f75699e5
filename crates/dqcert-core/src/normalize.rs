use crate::table::{Cell, Column, ColumnKind, Table};

/// Tokens that mean "no value" once surrounding whitespace is trimmed.
/// Comparison is case-sensitive.
pub const MISSING_TOKENS: [&str; 13] = [
    "", " ", "  ", "nan", "NaN", "NULL", "null", "N/A", "n/a", "NA", "na", "-", "--",
];

/// Returns true when the trimmed value is a missing-value sentinel.
pub fn is_missing_token(value: &str) -> bool {
    MISSING_TOKENS.contains(&value.trim())
}

/// Canonicalize sentinel tokens in text columns to [`Cell::Absent`].
///
/// Text cells are trimmed; numeric and temporal columns pass through
/// untouched, including their own absent representation.
pub fn normalize_missing(table: Table) -> Table {
    let row_count = table.row_count();
    let columns = table
        .into_columns()
        .into_iter()
        .map(normalize_column)
        .collect();
    Table::from_parts(columns, row_count)
}

fn normalize_column(mut column: Column) -> Column {
    if column.kind != ColumnKind::Text {
        return column;
    }

    for cell in &mut column.cells {
        let replacement = match cell {
            Cell::Text(value) => {
                let trimmed = value.trim();
                if MISSING_TOKENS.contains(&trimmed) {
                    Some(Cell::Absent)
                } else if trimmed.len() != value.len() {
                    Some(Cell::Text(trimmed.to_string()))
                } else {
                    None
                }
            }
            _ => None,
        };
        if let Some(replacement) = replacement {
            *cell = replacement;
        }
    }

    column
}
