//! Error taxonomy for the import and aggregation pipeline.
//!
//! Source spreadsheets are inconsistently formatted across sheets, so the
//! pipeline is deliberately partial-failure tolerant: [`ImportError::SourceFormat`],
//! [`ImportError::UnmatchedReference`] and [`ImportError::MissingMapping`] are
//! recovered locally (skip + count in the run summary) and never abort a
//! batch. I/O and CSV failures are fatal for the run.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    /// A malformed date/time/numeric cell. Recovered by skipping the row or
    /// cell; carried into the run summary with its position.
    #[error("row {row}: {reason}")]
    SourceFormat { row: usize, reason: String },

    /// A location label that matched no registered intersection. The caller
    /// proceeds with an absent reference.
    #[error("no intersection matched label {0:?}")]
    UnmatchedReference(String),

    /// A sheet or column with no configured semantic mapping. That unit is
    /// skipped entirely.
    #[error("no mapping configured for {0:?}")]
    MissingMapping(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl ImportError {
    pub fn source_format(row: usize, reason: impl Into<String>) -> Self {
        ImportError::SourceFormat {
            row,
            reason: reason.into(),
        }
    }
}
