//! NP-004: Spreadsheet sources — a typed cell model over xlsx and csv input.
//!
//! A workbook is a list of named sheets. The first row of every sheet is its
//! header; columns are looked up by header name, never by position.

pub mod delimited;
pub mod xlsx;

use crate::core::error::PrepError;
use std::path::Path;

/// One spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl Cell {
    /// Empty cells, empty strings, and NaN all count as "no value".
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.is_empty(),
            Self::Float(f) => f.is_nan(),
            Self::Int(_) | Self::Bool(_) => false,
        }
    }

    /// The cell's text, only if it holds text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    /// Render any non-empty cell as text. Integral floats drop the fraction.
    pub fn to_text(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        Some(match self {
            Self::Text(s) => s.clone(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
            Self::Float(f) => f.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Empty => return None,
        })
    }

    /// Coerce to an integer, truncating floats. Text is parsed.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            Self::Text(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(|f| f.trunc() as i64)
                })
            }
            _ => None,
        }
    }

    /// Coerce to a float. Text is parsed.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) if !f.is_nan() => Some(*f),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|f| !f.is_nan()),
            _ => None,
        }
    }

    /// JSON form used when a column is carried through unchanged.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            _ if self.is_empty() => serde_json::Value::Null,
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Empty => serde_json::Value::Null,
        }
    }

    /// Type a raw text field the way a spreadsheet reader would.
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::Empty;
        }
        let trimmed = raw.trim();
        if let Ok(i) = trimmed.parse::<i64>() {
            return Self::Int(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_finite() {
                return Self::Float(f);
            }
        }
        match trimmed {
            "true" | "TRUE" | "True" => Self::Bool(true),
            "false" | "FALSE" | "False" => Self::Bool(false),
            _ => Self::Text(raw.to_string()),
        }
    }
}

static EMPTY: Cell = Cell::Empty;

/// A named sheet: header row plus data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Whether the header row names `column`.
    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    /// Iterate data rows as header-addressable views.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |cells| Row {
            sheet: self,
            cells,
        })
    }
}

/// A borrowed view of one data row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    sheet: &'a Sheet,
    cells: &'a [Cell],
}

impl<'a> Row<'a> {
    /// The cell under `column`. None when the sheet has no such column;
    /// a short row yields `Cell::Empty` for trailing columns.
    pub fn get(&self, column: &str) -> Option<&'a Cell> {
        let idx = self.sheet.column_index(column)?;
        Some(self.cells.get(idx).unwrap_or(&EMPTY))
    }

    /// The cell under `column`, only if it holds a value.
    pub fn value(&self, column: &str) -> Option<&'a Cell> {
        self.get(column).filter(|c| !c.is_empty())
    }

    /// Every (header, cell) pair, padded with empty cells.
    pub fn columns(&self) -> impl Iterator<Item = (&'a str, &'a Cell)> + 'a {
        let cells = self.cells;
        let sheet = self.sheet;
        sheet
            .headers
            .iter()
            .enumerate()
            .map(move |(i, h)| (h.as_str(), cells.get(i).unwrap_or(&EMPTY)))
    }
}

/// Every sheet of one spreadsheet source, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Open a workbook: an xlsx-family file, a csv file, or a directory of csv files.
pub fn open_workbook(path: &Path) -> Result<Workbook, PrepError> {
    if path.is_dir() {
        return delimited::read_dir(path);
    }
    if !path.exists() {
        return Err(PrepError::Workbook {
            path: path.to_path_buf(),
            message: "no such file or directory".to_string(),
        });
    }
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => Ok(Workbook {
            sheets: vec![delimited::read_file(path)?],
        }),
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => xlsx::read(path),
        other => Err(PrepError::Workbook {
            path: path.to_path_buf(),
            message: format!("unsupported spreadsheet extension '{}'", other),
        }),
    }
}

/// Build headers from a raw header row; blank headers become `Unnamed: N`.
pub(crate) fn normalize_headers<I: IntoIterator<Item = String>>(raw: I) -> Vec<String> {
    raw.into_iter()
        .enumerate()
        .map(|(i, h)| {
            let h = h.trim();
            if h.is_empty() {
                format!("Unnamed: {}", i)
            } else {
                h.to_string()
            }
        })
        .collect()
}

/// Drop rows whose cells are all empty.
pub(crate) fn is_blank_row(cells: &[Cell]) -> bool {
    cells.iter().all(Cell::is_empty)
}
