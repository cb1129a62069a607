//! Error types for the keyword landscape pipeline.
//!
//! Only conditions that halt a run live here. Row-level problems are
//! reported through `sanitize::RowIssue` and URL problems through
//! `hierarchy::UrlIssue`; neither aborts the pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LandscapeError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

impl LandscapeError {
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, LandscapeError::MalformedInput(_))
    }
}

pub type Result<T> = std::result::Result<T, LandscapeError>;
