use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use dqcert_core::{Cell, ColumnKind};
use dqcert_ingest::{IngestError, LoadOptions, SourceFormat, load};

fn temp_file(label: &str, bytes: &[u8]) -> Result<PathBuf> {
    let mut dir = std::env::temp_dir();
    dir.push(format!("dqcert_ingest_{label}_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).context("create temp dir")?;
    let path = dir.join(format!("{label}.csv"));
    fs::write(&path, bytes).context("write fixture")?;
    Ok(path)
}

fn text_cell(loaded: &dqcert_ingest::LoadedTable, column: &str, row: usize) -> Result<String> {
    let column = loaded
        .table
        .column(column)
        .ok_or_else(|| anyhow!("missing column {column}"))?;
    match &column.cells[row] {
        Cell::Text(value) => Ok(value.clone()),
        other => Err(anyhow!("expected text cell, got {other:?}")),
    }
}

#[test]
fn loads_utf8_comma_file() -> Result<()> {
    let path = temp_file("utf8", "id,email\n1,a@b.com\n2,\n".as_bytes())?;
    let loaded = load(&path, &LoadOptions::default())?;

    assert_eq!(loaded.table.column_names(), vec!["id", "email"]);
    assert_eq!(loaded.table.row_count(), 2);
    assert_eq!(loaded.source.format, SourceFormat::Delimited);
    assert_eq!(loaded.source.encoding.as_deref(), Some("utf-8"));
    assert_eq!(loaded.source.delimiter, Some(','));
    assert!(!loaded.source.lossy_decoding);
    assert_eq!(loaded.source.sha256.len(), 64);
    assert_eq!(text_cell(&loaded, "email", 1)?, "");
    Ok(())
}

#[test]
fn loads_cp949_semicolon_file() -> Result<()> {
    let (bytes, _, _) = encoding_rs::EUC_KR.encode("번호;이름\n1;김철수\n2;이영희\n");
    let path = temp_file("cp949", &bytes)?;
    let loaded = load(&path, &LoadOptions::default())?;

    assert_eq!(loaded.source.encoding.as_deref(), Some("cp949"));
    assert_eq!(loaded.source.delimiter, Some(';'));
    assert_eq!(loaded.table.column_names(), vec!["번호", "이름"]);
    assert_eq!(text_cell(&loaded, "이름", 0)?, "김철수");
    Ok(())
}

#[test]
fn loads_utf16_tab_file() -> Result<()> {
    let mut bytes = vec![0xFF, 0xFE];
    bytes.extend(
        "id\tname\n1\tkim\n"
            .encode_utf16()
            .flat_map(|unit| unit.to_le_bytes()),
    );
    let path = temp_file("utf16", &bytes)?;
    let loaded = load(&path, &LoadOptions::default())?;

    assert_eq!(loaded.source.encoding.as_deref(), Some("utf-16"));
    assert_eq!(loaded.source.delimiter, Some('\t'));
    assert_eq!(text_cell(&loaded, "name", 0)?, "kim");
    Ok(())
}

#[test]
fn falls_back_to_latin1() -> Result<()> {
    let path = temp_file("latin1", b"city,code\nS\xE3o Paulo,1\nZ\xFCrich,2\n")?;
    let loaded = load(&path, &LoadOptions::default())?;

    assert_eq!(loaded.source.encoding.as_deref(), Some("latin-1"));
    assert_eq!(text_cell(&loaded, "city", 1)?, "Zürich");
    Ok(())
}

#[test]
fn infers_numeric_columns_and_keeps_text_verbatim() -> Result<()> {
    let path = temp_file("kinds", b"n,t\n1.5, N/A \n,x\n")?;
    let loaded = load(&path, &LoadOptions::default())?;

    let n = loaded.table.column("n").ok_or_else(|| anyhow!("n"))?;
    assert_eq!(n.kind, ColumnKind::Numeric);
    assert_eq!(n.cells, vec![Cell::Number(1.5), Cell::Absent]);
    assert_eq!(text_cell(&loaded, "t", 0)?, " N/A ");
    Ok(())
}

#[test]
fn peek_reads_only_requested_rows() -> Result<()> {
    let body: String = (0..500).map(|i| format!("{i},row{i}\n")).collect();
    let path = temp_file("peek", format!("id,label\n{body}").as_bytes())?;
    let loaded = load(&path, &LoadOptions::peek(5))?;

    assert_eq!(loaded.table.row_count(), 5);
    assert_eq!(loaded.table.column_names(), vec!["id", "label"]);
    Ok(())
}

#[test]
fn empty_file_is_undecodable() -> Result<()> {
    let path = temp_file("empty", b"")?;
    match load(&path, &LoadOptions::default()) {
        Err(IngestError::Undecodable { last_error, .. }) => {
            assert!(last_error.contains("no columns"), "{last_error}");
            Ok(())
        }
        other => Err(anyhow!("expected undecodable error, got {other:?}")),
    }
}

#[test]
fn header_only_file_loads_with_zero_rows() -> Result<()> {
    let path = temp_file("header", b"id,name\n")?;
    let loaded = load(&path, &LoadOptions::default())?;
    assert_eq!(loaded.table.row_count(), 0);
    assert_eq!(loaded.table.column_count(), 2);
    Ok(())
}

#[test]
fn missing_file_reports_io_error() {
    let path = std::env::temp_dir().join(format!("dqcert_missing_{}.csv", uuid::Uuid::new_v4()));
    let err = load(&path, &LoadOptions::default()).expect_err("missing file");
    assert!(matches!(err, IngestError::Io { .. }));
}

fn workbook_file(label: &str) -> Result<PathBuf> {
    use rust_xlsxwriter::Workbook;

    let mut dir = std::env::temp_dir();
    dir.push(format!("dqcert_ingest_{label}_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).context("create temp dir")?;
    let path = dir.join(format!("{label}.xlsx"));

    let mut workbook = Workbook::new();
    {
        let customers = workbook.add_worksheet();
        customers.set_name("customers")?;
        customers.write_string(0, 0, "id")?;
        customers.write_string(0, 1, "name")?;
        customers.write_number(1, 0, 1.0)?;
        customers.write_string(1, 1, "kim")?;
        customers.write_number(2, 0, 2.0)?;
        customers.write_string(2, 1, "lee")?;
    }
    {
        let archive = workbook.add_worksheet();
        archive.set_name("archive")?;
        archive.write_string(0, 0, "ignored")?;
        archive.write_string(1, 0, "row")?;
    }
    workbook.save(&path).context("save workbook")?;
    Ok(path)
}

#[test]
fn loads_first_sheet_of_workbook() -> Result<()> {
    let path = workbook_file("workbook")?;
    let loaded = load(&path, &LoadOptions::default())?;

    assert_eq!(loaded.source.format, SourceFormat::Spreadsheet);
    assert_eq!(loaded.source.sheet.as_deref(), Some("customers"));
    assert_eq!(loaded.source.encoding, None);
    assert_eq!(loaded.source.delimiter, None);
    assert_eq!(loaded.source.sha256.len(), 64);

    assert_eq!(loaded.table.column_names(), vec!["id", "name"]);
    assert_eq!(loaded.table.row_count(), 2);
    let id = loaded
        .table
        .column("id")
        .ok_or_else(|| anyhow!("missing id column"))?;
    assert_eq!(id.kind, ColumnKind::Numeric);
    assert_eq!(text_cell(&loaded, "name", 1)?, "lee");
    Ok(())
}

#[test]
fn missing_workbook_reports_io_error() {
    let path = std::env::temp_dir().join(format!("dqcert_missing_{}.xlsx", uuid::Uuid::new_v4()));
    let err = load(&path, &LoadOptions::default()).expect_err("missing workbook");
    assert!(matches!(err, IngestError::Io { .. }));
}
