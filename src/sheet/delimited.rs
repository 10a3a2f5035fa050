//! CSV sheets: a single `.csv` file, or a directory of them read as one workbook.

use super::{is_blank_row, normalize_headers, Cell, Sheet, Workbook};
use crate::core::error::PrepError;
use std::path::Path;

/// Read one csv file as a sheet named after the file stem.
pub fn read_file(path: &Path) -> Result<Sheet, PrepError> {
    let workbook_err = |message: String| PrepError::Workbook {
        path: path.to_path_buf(),
        message,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| workbook_err(e.to_string()))?;

    let headers = normalize_headers(
        reader
            .headers()
            .map_err(|e| workbook_err(e.to_string()))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string()),
    );

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| workbook_err(e.to_string()))?;
        let cells: Vec<Cell> = record.iter().map(Cell::parse).collect();
        if !is_blank_row(&cells) {
            rows.push(cells);
        }
    }

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok(Sheet::new(name, headers, rows))
}

/// Read every `*.csv` in a directory, sorted by file name, one sheet each.
pub fn read_dir(dir: &Path) -> Result<Workbook, PrepError> {
    let pattern = dir.join("*.csv");
    let pattern = pattern.to_string_lossy();
    let entries = glob::glob(&pattern).map_err(|e| PrepError::Workbook {
        path: dir.to_path_buf(),
        message: format!("bad glob pattern: {}", e),
    })?;

    let mut files: Vec<_> = entries.filter_map(Result::ok).collect();
    files.sort();

    if files.is_empty() {
        return Err(PrepError::Workbook {
            path: dir.to_path_buf(),
            message: "directory contains no .csv sheets".to_string(),
        });
    }

    let mut sheets = Vec::with_capacity(files.len());
    for file in &files {
        sheets.push(read_file(file)?);
    }
    Ok(Workbook { sheets })
}
