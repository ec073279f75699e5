use std::path::Path;

use crate::delimited::DelimitedSource;
use crate::error::Result;
use crate::options::LoadOptions;
use crate::source::{LoadedTable, SourceFormat};
use crate::spreadsheet::SpreadsheetSource;

/// Trait implemented by loaders that turn a file into a table.
pub trait TableSource {
    /// Returns the physical format handled by this source.
    fn format(&self) -> SourceFormat;

    /// Load the file. Reads only; the source file is never modified.
    fn load(&self, path: &Path, opts: &LoadOptions) -> Result<LoadedTable>;
}

/// Pick the loader for a path based on its extension.
pub fn source_for(path: &Path) -> Box<dyn TableSource> {
    match SourceFormat::detect(path) {
        SourceFormat::Spreadsheet => Box::new(SpreadsheetSource),
        SourceFormat::Delimited => Box::new(DelimitedSource),
    }
}

/// Load a delimited or spreadsheet file into a table.
pub fn load(path: &Path, opts: &LoadOptions) -> Result<LoadedTable> {
    source_for(path).load(path, opts)
}
