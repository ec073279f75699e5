use std::collections::{BTreeMap, HashSet};

use dqcert_core::{Cell, Column, ColumnKind, parse_timestamp};

/// Make header names usable as column keys: blanks become `Unnamed: {idx}`
/// and repeats get `.1`, `.2`, ... suffixes.
pub(crate) fn dedupe_headers(raw: Vec<String>) -> Vec<String> {
    let mut used = HashSet::new();
    let mut names = Vec::with_capacity(raw.len());

    for (idx, name) in raw.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {idx}")
        } else {
            name
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while used.contains(&candidate) {
            candidate = format!("{base}.{suffix}");
            suffix += 1;
        }
        used.insert(candidate.clone());
        names.push(candidate);
    }

    names
}

/// Build typed columns from raw text values. `None` marks a cell that was not
/// present in the record at all.
pub(crate) fn build_text_columns(
    headers: Vec<String>,
    values: Vec<Vec<Option<String>>>,
    overrides: &BTreeMap<String, ColumnKind>,
) -> Vec<Column> {
    headers
        .into_iter()
        .zip(values)
        .map(|(name, raw)| {
            let kind = overrides
                .get(&name)
                .copied()
                .unwrap_or_else(|| infer_kind(&raw));
            let cells = raw.into_iter().map(|value| to_cell(kind, value)).collect();
            Column::new(name, kind, cells)
        })
        .collect()
}

pub(crate) fn infer_kind(values: &[Option<String>]) -> ColumnKind {
    let mut filled = values
        .iter()
        .flatten()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .peekable();

    if filled.peek().is_none() {
        return ColumnKind::Text;
    }

    let filled: Vec<&str> = filled.collect();
    if filled.iter().all(|value| parse_number(value).is_some()) {
        ColumnKind::Numeric
    } else if filled.iter().all(|value| parse_timestamp(value).is_some()) {
        ColumnKind::Temporal
    } else {
        ColumnKind::Text
    }
}

fn to_cell(kind: ColumnKind, value: Option<String>) -> Cell {
    let Some(value) = value else {
        return Cell::Absent;
    };

    match kind {
        ColumnKind::Text => Cell::Text(value),
        ColumnKind::Numeric => parse_number(value.trim())
            .map(Cell::Number)
            .unwrap_or(Cell::Absent),
        ColumnKind::Temporal => parse_timestamp(&value)
            .map(Cell::Temporal)
            .unwrap_or(Cell::Absent),
    }
}

fn parse_number(value: &str) -> Option<f64> {
    if value.is_empty() {
        return None;
    }
    value.parse::<f64>().ok()
}
