//! End-of-run reporting.
//!
//! Batch imports optimize for completion: recoverable failures are counted
//! here instead of being surfaced per incident, and one summary is logged
//! when the run ends.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::ImportError;

/// How many unmatched labels the summary log prints verbatim.
const UNMATCHED_SAMPLE_SIZE: usize = 10;

/// Counters and samples accumulated across one import or aggregation run.
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub sheets_processed: usize,
    pub sheets_skipped: usize,
    pub columns_skipped: usize,
    pub rows_skipped: usize,
    pub records_written: usize,
    pub unmatched_labels: Vec<String>,
}

impl RunSummary {
    pub fn new() -> Self {
        RunSummary::default()
    }

    /// Records a skipped row or cell, logging its position and reason.
    pub fn record_skip(&mut self, sheet: &str, err: &ImportError) {
        warn!(sheet, error = %err, "Skipping row");
        self.rows_skipped += 1;
    }

    /// Records a sheet that had no usable semantic mapping.
    pub fn record_skipped_sheet(&mut self, err: &ImportError) {
        warn!(error = %err, "Skipping sheet");
        self.sheets_skipped += 1;
    }

    /// Records a volume column dropped before extraction.
    pub fn record_skipped_column(&mut self, sheet: &str, header: &str, reason: &str) {
        warn!(sheet, header, reason, "Skipping column");
        self.columns_skipped += 1;
    }

    /// Records a label that matched no registered intersection.
    pub fn record_unmatched(&mut self, label: &str) {
        warn!(label, "No intersection matched");
        self.unmatched_labels.push(label.to_string());
    }

    /// Logs the final counts plus a sample of unmatched labels.
    pub fn log(&self) {
        info!(
            sheets_processed = self.sheets_processed,
            sheets_skipped = self.sheets_skipped,
            columns_skipped = self.columns_skipped,
            rows_skipped = self.rows_skipped,
            records_written = self.records_written,
            unmatched = self.unmatched_labels.len(),
            "Run summary"
        );
        for label in self.unmatched_labels.iter().take(UNMATCHED_SAMPLE_SIZE) {
            info!(label, "Unmatched label");
        }
    }
}
