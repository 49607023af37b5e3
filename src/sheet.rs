//! Tabular dataset model for spreadsheet-shaped sources.
//!
//! A [`Workbook`] is a named set of [`Sheet`]s; a sheet is a header row plus
//! a grid of loosely typed [`Cell`]s. Real exports mix native date/time
//! values with strings holding the same data in several formats, so cells
//! carry type coercions (`as_date`, `as_time`, `as_number`) that tolerate
//! both.
//!
//! [`load_workbook_dir`] reads a directory of CSV files as one workbook,
//! one sheet per file with the file stem as the sheet name.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fs::File;
use std::path::Path;

use crate::error::ImportError;

/// One loosely typed spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

impl Cell {
    /// Builds a cell from raw CSV text: blank becomes [`Cell::Empty`],
    /// numeric text becomes [`Cell::Number`], anything else stays text.
    pub fn from_csv_field(field: &str) -> Cell {
        let trimmed = field.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            return Cell::Number(n);
        }
        Cell::Text(trimmed.to_string())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// A date, either native or a `YYYY-MM-DD` string. A datetime-typed
    /// cell yields its date part.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            Cell::DateTime(dt) => Some(dt.date()),
            Cell::Text(s) => {
                // Tolerate a trailing time component ("2024-03-01 00:00:00")
                let date_part = s.split_whitespace().next()?;
                NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
            }
            _ => None,
        }
    }

    /// A time of day, either native or a string tried as `HH:MM:SS` then
    /// `HH:MM`, in that order.
    pub fn as_time(&self) -> Option<NaiveTime> {
        match self {
            Cell::Time(t) => Some(*t),
            Cell::DateTime(dt) => Some(dt.time()),
            Cell::Text(s) => NaiveTime::parse_from_str(s, "%H:%M:%S")
                .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
                .ok(),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// A header row plus a grid of cells.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    /// The cell at (`row`, `col`); short rows read as [`Cell::Empty`].
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&Cell::Empty)
    }

    /// Index of the first column whose header contains `needle`
    /// (case-insensitive).
    pub fn find_column(&self, needle: &str) -> Option<usize> {
        let needle = needle.to_lowercase();
        self.columns
            .iter()
            .position(|c| c.to_lowercase().contains(&needle))
    }
}

/// A named set of sheets.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

/// Loads every `*.csv` file under `dir` as one sheet of a workbook.
///
/// A missing or unreadable directory is fatal for the run; no partial
/// processing is attempted.
pub fn load_workbook_dir(dir: &Path) -> Result<Workbook, ImportError> {
    let mut sheets = Vec::new();

    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("csv"))
        .collect();
    paths.sort();

    for path in paths {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        let file = File::open(&path)?;
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(file);

        let columns = rdr
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(record.iter().map(Cell::from_csv_field).collect());
        }

        sheets.push(Sheet {
            name,
            columns,
            rows,
        });
    }

    Ok(Workbook { sheets })
}
