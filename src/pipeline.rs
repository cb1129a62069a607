//! Pipeline functions for programmatic use by the CLI and tests.
//!
//! `run_pipeline` is the pure core: raw table bytes and parameters in,
//! result records out. `build_landscape` wraps it with file input and
//! workbook output.

use crate::error::Result;
use crate::export;
use crate::record::{Origin, ResultRecord};
use crate::sanitize::{sanitize_bytes, DroppedRow, HeaderPolicy};
use crate::select::{select_keywords, SelectionConfig};
use log::info;
use std::collections::HashSet;
use std::path::PathBuf;

/// File name of the exported workbook.
pub const DEFAULT_OUTPUT_NAME: &str = "keyword_landscape.xlsx";

// ============================================================================
// Core pipeline
// ============================================================================

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct Landscape {
    pub selection: SelectionConfig,
    pub rows_read: usize,
    pub rows_kept: usize,
    pub dropped: Vec<DroppedRow>,
    pub rows: Vec<ResultRecord>,
}

/// Counts shown on the workbook's summary sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub keyword_limit: usize,
    pub include_top_search_volume: bool,
    pub rows_read: usize,
    pub rows_kept: usize,
    pub rows_dropped: usize,
    pub urls: usize,
    pub per_url_rows: usize,
    pub top_volume_rows: usize,
    pub empty_hierarchies: usize,
}

impl Landscape {
    pub fn summary(&self) -> RunSummary {
        let urls: HashSet<&str> = self.rows.iter().map(|r| r.url()).collect();
        let count = |origin: Origin| self.rows.iter().filter(|r| r.origin == origin).count();
        RunSummary {
            keyword_limit: self.selection.keyword_limit.get(),
            include_top_search_volume: self.selection.include_top_search_volume,
            rows_read: self.rows_read,
            rows_kept: self.rows_kept,
            rows_dropped: self.dropped.len(),
            urls: urls.len(),
            per_url_rows: count(Origin::PerUrl),
            top_volume_rows: count(Origin::TopVolume),
            empty_hierarchies: self.rows.iter().filter(|r| r.hierarchy.is_empty()).count(),
        }
    }
}

/// Sanitize, select and annotate one uploaded table.
///
/// Fails only on `MalformedInput`; bad rows and bad URLs degrade the output
/// instead. Identical inputs always yield identical rows in identical order.
pub fn run_pipeline(
    input: &[u8],
    selection: &SelectionConfig,
    header_policy: HeaderPolicy,
) -> Result<Landscape> {
    let report = sanitize_bytes(input, header_policy)?;
    let rows: Vec<ResultRecord> = select_keywords(&report.records, selection).collect();

    info!(
        "Selected {} keywords (limit {} per URL, top volume {})",
        rows.len(),
        selection.keyword_limit.get(),
        if selection.include_top_search_volume { "on" } else { "off" }
    );

    Ok(Landscape {
        selection: *selection,
        rows_read: report.rows_read,
        rows_kept: report.records.len(),
        dropped: report.dropped,
        rows,
    })
}

// ============================================================================
// Build Landscape Workbook
// ============================================================================

/// Configuration for the file-level export.
#[derive(Debug, Clone)]
pub struct LandscapeConfig {
    /// Input CSV path
    pub input: PathBuf,
    /// Output xlsx path
    pub output: PathBuf,
    pub selection: SelectionConfig,
    pub header_policy: HeaderPolicy,
    /// Add a Summary sheet after the results
    pub summary_sheet: bool,
}

impl LandscapeConfig {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: PathBuf::from(DEFAULT_OUTPUT_NAME),
            selection: SelectionConfig::default(),
            header_policy: HeaderPolicy::default(),
            summary_sheet: false,
        }
    }
}

/// Read the input CSV and run the pipeline on it.
pub fn load_landscape(config: &LandscapeConfig) -> Result<Landscape> {
    let bytes = std::fs::read(&config.input)?;
    run_pipeline(&bytes, &config.selection, config.header_policy)
}

/// Run the pipeline on `config.input` and save the workbook to `config.output`.
///
/// Returns a summary string on success.
pub fn build_landscape(config: &LandscapeConfig) -> Result<String> {
    let landscape = load_landscape(config)?;
    let summary = landscape.summary();
    export::save_workbook(
        &config.output,
        &landscape.rows,
        config.summary_sheet.then_some(&summary),
    )?;

    Ok(format!(
        "Landscape created: {}\n  Input rows: {} ({} dropped)\n  Keywords: {} across {} URLs",
        config.output.display(),
        summary.rows_read,
        summary.rows_dropped,
        landscape.rows.len(),
        summary.urls,
    ))
}
