//! Excel/ODS workbooks via calamine. Every sheet is read; row 0 is the header.

use super::{is_blank_row, normalize_headers, Cell, Sheet, Workbook};
use crate::core::error::PrepError;
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

/// Read every sheet of a spreadsheet file, in workbook order.
pub fn read(path: &Path) -> Result<Workbook, PrepError> {
    let workbook_err = |message: String| PrepError::Workbook {
        path: path.to_path_buf(),
        message,
    };

    let mut book = open_workbook_auto(path).map_err(|e| workbook_err(e.to_string()))?;
    let names = book.sheet_names();

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = book
            .worksheet_range(&name)
            .map_err(|e| workbook_err(format!("sheet '{}': {}", name, e)))?;

        let mut rows = range.rows();
        let headers = match rows.next() {
            Some(header_row) => normalize_headers(header_row.iter().map(|c| c.to_string())),
            None => Vec::new(),
        };
        let data: Vec<Vec<Cell>> = rows
            .map(|r| r.iter().map(cell_from).collect::<Vec<_>>())
            .filter(|cells| !is_blank_row(cells))
            .collect();

        tracing::debug!(sheet = %name, rows = data.len(), "read worksheet");
        sheets.push(Sheet::new(name, headers, data));
    }

    Ok(Workbook { sheets })
}

/// Map a calamine cell into the shared cell model.
fn cell_from(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::String(s) => Cell::Text(s.clone()),
        other => Cell::Text(other.to_string()),
    }
}
