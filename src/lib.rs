//! Keyword Landscape
//!
//! Tools for picking representative keywords per URL from a keyword-ranking
//! export and mapping each URL onto its site-section hierarchy.
//!
//! This library provides:
//! - `sanitize`: Input decoding, header mapping and row validation
//! - `select`: Per-URL keyword scoring, top-volume augmentation and dedup
//! - `hierarchy`: URL to site-section level extraction
//! - `export`: Spreadsheet and CSV output
//! - `pipeline`: End-to-end entry points
//!
//! Binaries:
//! - `keyword-landscape`: CLI for exporting and previewing landscapes

pub mod error;
pub mod export;
pub mod hierarchy;
pub mod pipeline;
pub mod record;
pub mod sanitize;
pub mod select;

pub use error::{LandscapeError, Result};
pub use hierarchy::{extract_hierarchy, Hierarchy, HierarchyOutcome};
pub use pipeline::{build_landscape, run_pipeline, Landscape, LandscapeConfig};
pub use record::{CleanRecord, Cpc, ResultRecord};
pub use sanitize::HeaderPolicy;
pub use select::{KeywordLimit, SelectionConfig};
