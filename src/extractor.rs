//! Record extraction from tabular traffic-count sheets.
//!
//! A sheet has a date column, a time column, and one or more directional
//! volume columns. Rows are time samples; each qualifying (row, column)
//! cell becomes one raw observation. Sheets are inconsistently formatted,
//! so every row-level failure is caught, counted in the [`RunSummary`], and
//! never aborts the rest of the sheet.

use chrono::{NaiveDateTime, NaiveTime};

use crate::direction::{DirectionSynonyms, resolve_direction};
use crate::error::ImportError;
use crate::models::Direction;
use crate::report::RunSummary;
use crate::sheet::Sheet;

/// Headers containing any of these are never volume columns.
const COLUMN_STOPLIST: &[&str] = &["day", "time", "minutos", "total", "divided", "nan"];

/// One observation extracted from a sheet, tagged with its source column so
/// the caller can resolve the target intersection per column header.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetObservation {
    pub column: usize,
    pub timestamp: NaiveDateTime,
    pub direction: Direction,
    pub volume: u32,
}

/// Column indices located in a sheet before extraction starts.
#[derive(Debug, Clone)]
pub struct SheetLayout {
    pub date_col: usize,
    pub time_col: usize,
    /// Volume columns with their resolved directions.
    pub volume_cols: Vec<(usize, Direction)>,
}

/// Locates the date, time, and directional volume columns of a sheet.
///
/// A sheet without a date or time column has no usable semantic mapping and
/// is skipped wholesale ([`ImportError::MissingMapping`]). Volume columns
/// must carry a parenthesized token and none of the stoplist words; columns
/// whose direction code does not resolve are dropped here and counted by
/// the caller.
pub fn detect_layout(
    sheet: &Sheet,
    synonyms: &DirectionSynonyms,
    summary: &mut RunSummary,
) -> Result<SheetLayout, ImportError> {
    let date_col = sheet.find_column("day");
    let time_col = sheet.find_column("time");
    let (Some(date_col), Some(time_col)) = (date_col, time_col) else {
        return Err(ImportError::MissingMapping(sheet.name.clone()));
    };

    let mut volume_cols = Vec::new();
    for (idx, header) in sheet.columns.iter().enumerate() {
        let lower = header.to_lowercase();
        if COLUMN_STOPLIST.iter().any(|stop| lower.contains(stop)) {
            continue;
        }
        if !(header.contains('(') && header.contains(')')) {
            continue;
        }
        match resolve_direction(header, synonyms) {
            Some(direction) => volume_cols.push((idx, direction)),
            None => summary.record_skipped_column(&sheet.name, header, "unresolved direction"),
        }
    }

    Ok(SheetLayout {
        date_col,
        time_col,
        volume_cols,
    })
}

/// Walks every row of a sheet, emitting one observation per qualifying
/// (timestamp, direction, volume) cell.
///
/// Rows with a missing date or time cell are skipped silently; rows with a
/// present but unparseable cell are counted as source-format skips. Zero
/// volume cells emit nothing: the source data uses zero to mean "no
/// observation", not a real count.
pub fn extract_sheet(
    sheet: &Sheet,
    layout: &SheetLayout,
    summary: &mut RunSummary,
) -> Vec<SheetObservation> {
    let mut observations = Vec::new();

    for row in 0..sheet.rows.len() {
        let timestamp = match row_timestamp(sheet, layout, row) {
            Ok(Some(ts)) => ts,
            Ok(None) => continue,
            Err(err) => {
                summary.record_skip(&sheet.name, &err);
                continue;
            }
        };

        for &(col, direction) in &layout.volume_cols {
            let cell = sheet.cell(row, col);
            if cell.is_empty() {
                continue;
            }
            let Some(value) = cell.as_number() else {
                summary.record_skip(
                    &sheet.name,
                    &ImportError::source_format(row, format!("non-numeric volume in column {col}")),
                );
                continue;
            };
            if value < 0.0 {
                summary.record_skip(
                    &sheet.name,
                    &ImportError::source_format(row, format!("negative volume in column {col}")),
                );
                continue;
            }
            if value == 0.0 {
                continue;
            }
            observations.push(SheetObservation {
                column: col,
                timestamp,
                direction,
                volume: value as u32,
            });
        }
    }

    observations
}

/// Combines the date and time cells of one row into a single timestamp.
///
/// `Ok(None)` means the row has no date or time at all; `Err` means a cell
/// was present but unparseable.
fn row_timestamp(
    sheet: &Sheet,
    layout: &SheetLayout,
    row: usize,
) -> Result<Option<NaiveDateTime>, ImportError> {
    let date_cell = sheet.cell(row, layout.date_col);
    let time_cell = sheet.cell(row, layout.time_col);
    if date_cell.is_empty() || time_cell.is_empty() {
        return Ok(None);
    }

    let date = date_cell
        .as_date()
        .ok_or_else(|| ImportError::source_format(row, format!("unparseable date: {date_cell:?}")))?;
    let time: NaiveTime = time_cell
        .as_time()
        .ok_or_else(|| ImportError::source_format(row, format!("unparseable time: {time_cell:?}")))?;

    Ok(Some(NaiveDateTime::new(date, time)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::Cell;
    use chrono::NaiveDate;

    fn sheet(columns: &[&str], rows: Vec<Vec<Cell>>) -> Sheet {
        Sheet {
            name: "Córdova".to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn layout(sheet: &Sheet) -> SheetLayout {
        let mut summary = RunSummary::new();
        detect_layout(sheet, &DirectionSynonyms::default(), &mut summary).unwrap()
    }

    #[test]
    fn test_detect_layout_finds_volume_columns() {
        let s = sheet(
            &["DAY", "Time", "Av. Cordova (NS)", "Av. Bolivar (OE)", "Total (veh)", "15 minutos"],
            vec![],
        );
        let l = layout(&s);
        assert_eq!(l.date_col, 0);
        assert_eq!(l.time_col, 1);
        assert_eq!(
            l.volume_cols,
            vec![(2, Direction::NS), (3, Direction::WE)]
        );
    }

    #[test]
    fn test_detect_layout_requires_date_and_time() {
        let s = sheet(&["Av. Cordova (NS)"], vec![]);
        let mut summary = RunSummary::new();
        let err = detect_layout(&s, &DirectionSynonyms::default(), &mut summary).unwrap_err();
        assert!(matches!(err, ImportError::MissingMapping(_)));
    }

    #[test]
    fn test_unresolvable_direction_column_is_dropped() {
        let s = sheet(&["DAY", "Time", "Road (ABC)"], vec![]);
        let mut summary = RunSummary::new();
        let l = detect_layout(&s, &DirectionSynonyms::default(), &mut summary).unwrap();
        assert!(l.volume_cols.is_empty());
        assert_eq!(summary.columns_skipped, 1);
    }

    #[test]
    fn test_extracts_one_observation_per_touched_cell() {
        let s = sheet(
            &["DAY", "Time", "Road (NS)"],
            vec![vec![text("2024-03-01"), text("08:15"), Cell::Number(42.0)]],
        );
        let l = layout(&s);
        let mut summary = RunSummary::new();
        let obs = extract_sheet(&s, &l, &mut summary);

        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].direction, Direction::NS);
        assert_eq!(obs[0].volume, 42);
        assert_eq!(
            obs[0].timestamp,
            NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(8, 15, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_zero_and_missing_volumes_emit_nothing() {
        let s = sheet(
            &["DAY", "Time", "Road (NS)"],
            vec![
                vec![text("2024-03-01"), text("08:15"), Cell::Number(0.0)],
                vec![text("2024-03-01"), text("08:30"), Cell::Empty],
            ],
        );
        let l = layout(&s);
        let mut summary = RunSummary::new();
        let obs = extract_sheet(&s, &l, &mut summary);
        assert!(obs.is_empty());
        assert_eq!(summary.rows_skipped, 0);
    }

    #[test]
    fn test_missing_date_or_time_skips_row_silently() {
        let s = sheet(
            &["DAY", "Time", "Road (NS)"],
            vec![
                vec![Cell::Empty, text("08:15"), Cell::Number(5.0)],
                vec![text("2024-03-01"), Cell::Empty, Cell::Number(5.0)],
            ],
        );
        let l = layout(&s);
        let mut summary = RunSummary::new();
        let obs = extract_sheet(&s, &l, &mut summary);
        assert!(obs.is_empty());
        assert_eq!(summary.rows_skipped, 0);
    }

    #[test]
    fn test_malformed_time_is_counted_and_does_not_abort() {
        let s = sheet(
            &["DAY", "Time", "Road (NS)"],
            vec![
                vec![text("2024-03-01"), text("8h15"), Cell::Number(5.0)],
                vec![text("2024-03-01"), text("08:30"), Cell::Number(7.0)],
            ],
        );
        let l = layout(&s);
        let mut summary = RunSummary::new();
        let obs = extract_sheet(&s, &l, &mut summary);

        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].volume, 7);
        assert_eq!(summary.rows_skipped, 1);
    }

    #[test]
    fn test_native_typed_date_and_time_cells() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let time = chrono::NaiveTime::from_hms_opt(8, 15, 0).unwrap();
        let s = sheet(
            &["DAY", "Time", "Road (SN)"],
            vec![vec![Cell::Date(date), Cell::Time(time), Cell::Number(3.0)]],
        );
        let l = layout(&s);
        let mut summary = RunSummary::new();
        let obs = extract_sheet(&s, &l, &mut summary);
        assert_eq!(obs[0].timestamp, NaiveDateTime::new(date, time));
    }
}
