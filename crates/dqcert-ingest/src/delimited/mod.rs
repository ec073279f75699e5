//! Delimited-text ingestion with encoding fallback and delimiter sniffing.

use std::path::Path;

use dqcert_core::Table;
use tracing::{debug, info, warn};

use crate::adapter::TableSource;
use crate::columns::{build_text_columns, dedupe_headers};
use crate::error::{IngestError, Result};
use crate::options::LoadOptions;
use crate::source::{LoadedTable, SourceFormat, SourceInfo, fingerprint};

mod encoding;
mod sniff;

pub use encoding::{ENCODING_CANDIDATES, TextEncoding};
pub use sniff::{DELIMITER_CANDIDATES, sniff_delimiter};

/// Loader for CSV/TSV-like text files of unknown encoding and delimiter.
#[derive(Debug, Clone, Copy, Default)]
pub struct DelimitedSource;

impl TableSource for DelimitedSource {
    fn format(&self) -> SourceFormat {
        SourceFormat::Delimited
    }

    fn load(&self, path: &Path, opts: &LoadOptions) -> Result<LoadedTable> {
        let bytes = std::fs::read(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let sha256 = fingerprint(&bytes);

        let decoded = decode_table(&bytes, opts).map_err(|last_error| {
            IngestError::Undecodable {
                path: path.to_path_buf(),
                last_error,
            }
        })?;

        info!(
            path = %path.display(),
            encoding = decoded.encoding.label(),
            delimiter = %char::from(decoded.delimiter).escape_default(),
            lossy = decoded.lossy,
            rows = decoded.table.row_count(),
            columns = decoded.table.column_count(),
            "delimited file loaded"
        );

        Ok(LoadedTable {
            table: decoded.table,
            source: SourceInfo {
                path: path.to_path_buf(),
                format: SourceFormat::Delimited,
                encoding: Some(decoded.encoding.label().to_string()),
                delimiter: Some(char::from(decoded.delimiter)),
                lossy_decoding: decoded.lossy,
                sheet: None,
                sha256,
            },
        })
    }
}

/// Outcome of the first successful encoding attempt.
#[derive(Debug)]
pub struct DecodedTable {
    pub table: Table,
    pub encoding: TextEncoding,
    pub delimiter: u8,
    pub lossy: bool,
}

/// Decode raw bytes into a table.
///
/// Every candidate encoding is first tried strictly; only when all strict
/// attempts fail are the same encodings retried with invalid sequences
/// dropped. Lossy UTF-8 accepts any input, so running it before the strict
/// legacy attempts would shadow them. On total failure the last error message
/// is returned.
pub fn decode_table(bytes: &[u8], opts: &LoadOptions) -> std::result::Result<DecodedTable, String> {
    let mut last_error = String::from("no encoding attempted");

    for encoding in ENCODING_CANDIDATES {
        let Some(text) = encoding.decode_strict(bytes) else {
            debug!(encoding = encoding.label(), "strict decoding failed");
            last_error = format!("'{}' codec can't decode the input", encoding.label());
            continue;
        };
        match parse_text(&text, opts) {
            Ok((table, delimiter)) => {
                return Ok(DecodedTable {
                    table,
                    encoding,
                    delimiter,
                    lossy: false,
                });
            }
            Err(err) => {
                debug!(encoding = encoding.label(), error = %err, "parse failed");
                last_error = err;
            }
        }
    }

    // Lossy pass runs after every strict attempt, not strict-then-lossy per encoding.
    for encoding in ENCODING_CANDIDATES {
        let Some((text, lossy)) = encoding.decode_lossy(bytes) else {
            continue;
        };
        match parse_text(&text, opts) {
            Ok((table, delimiter)) => {
                if lossy {
                    warn!(
                        encoding = encoding.label(),
                        "decoded with invalid byte sequences dropped"
                    );
                }
                return Ok(DecodedTable {
                    table,
                    encoding,
                    delimiter,
                    lossy,
                });
            }
            Err(err) => {
                debug!(encoding = encoding.label(), error = %err, "lossy parse failed");
                last_error = err;
            }
        }
    }

    Err(last_error)
}

fn parse_text(text: &str, opts: &LoadOptions) -> std::result::Result<(Table, u8), String> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.contains('\0') {
        return Err("decoded text contains NUL characters".to_string());
    }

    let delimiter = sniff_delimiter(text);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record.map_err(|err| err.to_string())?,
        None => return Err("no columns to parse from file".to_string()),
    };
    let headers = dedupe_headers(header.iter().map(str::to_string).collect());
    let width = headers.len();

    let mut values: Vec<Vec<Option<String>>> = vec![Vec::new(); width];
    let limit = opts.row_limit.unwrap_or(usize::MAX);
    for (row_idx, record) in records.take(limit).enumerate() {
        let record = record.map_err(|err| err.to_string())?;
        if record.len() > width {
            return Err(format!(
                "expected {} fields in line {}, saw {}",
                width,
                row_idx + 2,
                record.len()
            ));
        }
        for (col_idx, column) in values.iter_mut().enumerate() {
            column.push(record.get(col_idx).map(str::to_string));
        }
    }

    let columns = build_text_columns(headers, values, &opts.column_kinds);
    let table = Table::new(columns).map_err(|err| err.to_string())?;
    Ok((table, delimiter))
}
