//! Workbook ingestion (first sheet only).

use std::path::Path;

use calamine::{Data, Range, Reader, open_workbook_auto};
use dqcert_core::{Cell, Column, ColumnKind, Table, parse_timestamp};
use tracing::info;

use crate::adapter::TableSource;
use crate::columns::dedupe_headers;
use crate::error::{IngestError, Result};
use crate::options::LoadOptions;
use crate::source::{LoadedTable, SourceFormat, SourceInfo, fingerprint};

/// Loader for Excel/ODS workbooks.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpreadsheetSource;

impl TableSource for SpreadsheetSource {
    fn format(&self) -> SourceFormat {
        SourceFormat::Spreadsheet
    }

    fn load(&self, path: &Path, opts: &LoadOptions) -> Result<LoadedTable> {
        let bytes = std::fs::read(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut workbook = open_workbook_auto(path)?;
        let sheet = workbook.sheet_names().first().cloned();
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| IngestError::NoSheets(path.to_path_buf()))??;
        let table = table_from_range(&range, opts)?;

        info!(
            path = %path.display(),
            sheet = sheet.as_deref().unwrap_or_default(),
            rows = table.row_count(),
            columns = table.column_count(),
            "spreadsheet loaded"
        );

        Ok(LoadedTable {
            table,
            source: SourceInfo {
                path: path.to_path_buf(),
                format: SourceFormat::Spreadsheet,
                encoding: None,
                delimiter: None,
                lossy_decoding: false,
                sheet,
                sha256: fingerprint(&bytes),
            },
        })
    }
}

/// Convert a worksheet range into a table; the first row is the header.
pub fn table_from_range(range: &Range<Data>, opts: &LoadOptions) -> Result<Table> {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Table::new(Vec::new())?);
    };

    let headers = dedupe_headers(header.iter().map(header_name).collect());
    let limit = opts.row_limit.unwrap_or(usize::MAX);
    let body: Vec<&[Data]> = rows.take(limit).collect();

    let columns = headers
        .into_iter()
        .enumerate()
        .map(|(idx, name)| {
            let raw: Vec<&Data> = body
                .iter()
                .map(|row| row.get(idx).unwrap_or(&Data::Empty))
                .collect();
            let kind = opts
                .column_kinds
                .get(&name)
                .copied()
                .unwrap_or_else(|| infer_kind(&raw));
            let cells = raw.into_iter().map(|data| to_cell(kind, data)).collect();
            Column::new(name, kind, cells)
        })
        .collect();

    Ok(Table::new(columns)?)
}

fn header_name(data: &Data) -> String {
    match data {
        Data::Empty => String::new(),
        other => render(other),
    }
}

fn is_blank(data: &Data) -> bool {
    match data {
        Data::Empty => true,
        Data::String(value) => value.trim().is_empty(),
        _ => false,
    }
}

fn infer_kind(values: &[&Data]) -> ColumnKind {
    let filled: Vec<&Data> = values.iter().copied().filter(|d| !is_blank(d)).collect();
    if filled.is_empty() {
        ColumnKind::Text
    } else if filled
        .iter()
        .all(|d| matches!(d, Data::Int(_) | Data::Float(_)))
    {
        ColumnKind::Numeric
    } else if filled
        .iter()
        .all(|d| matches!(d, Data::DateTime(_) | Data::DateTimeIso(_)))
    {
        ColumnKind::Temporal
    } else {
        ColumnKind::Text
    }
}

fn to_cell(kind: ColumnKind, data: &Data) -> Cell {
    if matches!(data, Data::Empty) {
        return Cell::Absent;
    }

    match kind {
        ColumnKind::Text => Cell::Text(render(data)),
        ColumnKind::Numeric => match data {
            Data::Int(value) => Cell::Number(*value as f64),
            Data::Float(value) => Cell::Number(*value),
            Data::String(value) => value
                .trim()
                .parse::<f64>()
                .map(Cell::Number)
                .unwrap_or(Cell::Absent),
            _ => Cell::Absent,
        },
        ColumnKind::Temporal => temporal_value(data)
            .map(Cell::Temporal)
            .unwrap_or(Cell::Absent),
    }
}

fn temporal_value(data: &Data) -> Option<chrono::NaiveDateTime> {
    match data {
        Data::DateTime(value) => value.as_datetime(),
        Data::DateTimeIso(value) | Data::String(value) => parse_timestamp(value),
        _ => None,
    }
}

fn render(data: &Data) -> String {
    match data {
        Data::Empty => String::new(),
        Data::String(value) | Data::DateTimeIso(value) | Data::DurationIso(value) => value.clone(),
        Data::Int(value) => value.to_string(),
        Data::Float(value) => Cell::Number(*value).render().unwrap_or_default(),
        Data::Bool(value) => if *value { "True" } else { "False" }.to_string(),
        Data::DateTime(value) => value
            .as_datetime()
            .and_then(|dt| Cell::Temporal(dt).render())
            .unwrap_or_else(|| value.as_f64().to_string()),
        Data::Error(err) => format!("#{err:?}"),
    }
}
