//! Keyword ranking records as they move through the pipeline.

use crate::hierarchy::Hierarchy;
use serde::Deserialize;
use std::fmt;

/// Sentinel written when a row has no CPC value.
pub const CPC_NOT_AVAILABLE: &str = "N/A";

/// One input row projected onto the five canonical fields, before coercion.
///
/// Fields are deserialized positionally in canonical order
/// (URL, Keyword, Blended Rank, Search Volume, CPC). Empty cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawRecord {
    pub url: Option<String>,
    pub keyword: Option<String>,
    pub blended_rank: Option<String>,
    pub search_volume: Option<String>,
    pub cpc: Option<String>,
}

/// Cost-per-click as supplied by the ranking export.
#[derive(Debug, Clone, PartialEq)]
pub enum Cpc {
    Amount(f64),
    /// Non-numeric text, kept verbatim
    Text(String),
    NotAvailable,
}

impl Cpc {
    /// Interpret a raw CPC cell. Blank cells become `NotAvailable`.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(text) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Cpc::NotAvailable;
        };
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => Cpc::Amount(value),
            _ => Cpc::Text(text.to_string()),
        }
    }

    pub fn amount(&self) -> Option<f64> {
        match self {
            Cpc::Amount(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Cpc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cpc::Amount(value) => write!(f, "{}", value),
            Cpc::Text(text) => f.write_str(text),
            Cpc::NotAvailable => f.write_str(CPC_NOT_AVAILABLE),
        }
    }
}

/// A validated row: every required field present and numeric where it must be.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanRecord {
    pub url: String,
    pub keyword: String,
    /// Lower is better
    pub blended_rank: f64,
    pub search_volume: f64,
    pub cpc: Cpc,
}

impl CleanRecord {
    /// Composite score: `1/(rank+1) + volume/max_volume`.
    ///
    /// The volume term is 0 when `max_volume` is 0.
    pub fn score(&self, max_volume: f64) -> f64 {
        let rank_score = 1.0 / (self.blended_rank + 1.0);
        let volume_score = if max_volume > 0.0 {
            self.search_volume / max_volume
        } else {
            0.0
        };
        rank_score + volume_score
    }
}

/// A clean record with its score, alive only while a partition is ranked.
#[derive(Debug, Clone, Copy)]
pub struct ScoredRecord<'a> {
    pub record: &'a CleanRecord,
    pub score: f64,
}

/// Why a row made it into the result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Among the top-K scored keywords for its URL
    PerUrl,
    /// Among the top-K keywords by search volume across the dataset
    TopVolume,
}

/// A selected row with its URL hierarchy attached. Unique by (URL, Keyword).
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub record: CleanRecord,
    pub hierarchy: Hierarchy,
    pub origin: Origin,
}

impl ResultRecord {
    pub fn url(&self) -> &str {
        &self.record.url
    }

    pub fn keyword(&self) -> &str {
        &self.record.keyword
    }
}
