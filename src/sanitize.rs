//! Row sanitizer: decodes the uploaded table, maps its columns onto the
//! canonical schema and turns raw rows into [`CleanRecord`]s.
//!
//! Rows missing a required field, or carrying a non-numeric rank or volume,
//! are dropped and reported. They are never repaired.

use crate::error::{LandscapeError, Result};
use crate::record::{CleanRecord, Cpc, RawRecord};
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info, warn};
use regex::Regex;
use std::borrow::Cow;
use std::fmt;
use std::path::Path;

/// The five input fields, in canonical column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Url,
    Keyword,
    BlendedRank,
    SearchVolume,
    Cpc,
}

pub const CANONICAL_FIELDS: [Field; 5] = [
    Field::Url,
    Field::Keyword,
    Field::BlendedRank,
    Field::SearchVolume,
    Field::Cpc,
];

impl Field {
    /// Column title used on output.
    pub fn name(&self) -> &'static str {
        match self {
            Field::Url => "URL",
            Field::Keyword => "Keyword",
            Field::BlendedRank => "Blended Rank",
            Field::SearchVolume => "Search Volume",
            Field::Cpc => "CPC",
        }
    }

    /// Normalized header spellings accepted for this field.
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Field::Url => &[
                "url",
                "urls",
                "address",
                "page",
                "pageurl",
                "landingpage",
                "rankingurl",
                "rankingpage",
                "currenturl",
                "targeturl",
                "topurl",
            ],
            Field::Keyword => &["keyword", "keywords", "query", "searchterm", "term"],
            Field::BlendedRank => &[
                "blendedrank",
                "rank",
                "ranking",
                "position",
                "rankposition",
                "currentposition",
                "currentrank",
                "googleposition",
            ],
            Field::SearchVolume => &[
                "searchvolume",
                "volume",
                "sv",
                "monthlysearchvolume",
                "avgmonthlysearches",
                "globalvolume",
            ],
            Field::Cpc => &["cpc", "costperclick", "avgcpc"],
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How header text is checked before columns are assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderPolicy {
    /// Every field must be found by header name; columns are read by the
    /// resolved index.
    #[default]
    Validated,
    /// Columns are taken in canonical order regardless of header text.
    Positional,
}

/// Column index of each canonical field in the input table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    indices: [usize; 5],
}

lazy_static::lazy_static! {
    static ref NON_ALNUM: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
    static ref GROUPED_NUMBER: Regex = Regex::new(r"^\d{1,3}(,\d{3})+(\.\d+)?$").unwrap();
}

/// Lowercase a header and strip everything but ASCII letters and digits.
pub fn normalize_header(header: &str) -> String {
    NON_ALNUM
        .replace_all(&header.trim().to_lowercase(), "")
        .into_owned()
}

impl ColumnMapping {
    pub fn positional() -> Self {
        Self {
            indices: [0, 1, 2, 3, 4],
        }
    }

    /// Resolve the canonical fields against a header row.
    pub fn resolve(headers: &StringRecord, policy: HeaderPolicy) -> Result<Self> {
        if headers.len() < CANONICAL_FIELDS.len() {
            return Err(LandscapeError::MalformedInput(format!(
                "expected at least {} columns ({}), found {}",
                CANONICAL_FIELDS.len(),
                CANONICAL_FIELDS.map(|f| f.name()).join(", "),
                headers.len()
            )));
        }

        if policy == HeaderPolicy::Positional {
            return Ok(Self::positional());
        }

        let normalized: Vec<String> = headers.iter().map(normalize_header).collect();
        let mut indices = [0usize; 5];
        let mut problems = Vec::new();

        for (slot, field) in CANONICAL_FIELDS.iter().enumerate() {
            let matches: Vec<usize> = normalized
                .iter()
                .enumerate()
                .filter(|(_, h)| field.aliases().contains(&h.as_str()))
                .map(|(i, _)| i)
                .collect();
            match matches.as_slice() {
                [idx] => indices[slot] = *idx,
                [] => problems.push(format!("no column for '{}'", field)),
                many => problems.push(format!(
                    "'{}' matches {} columns ({})",
                    field,
                    many.len(),
                    many.iter()
                        .map(|&i| headers.get(i).unwrap_or("").to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )),
            }
        }

        if !problems.is_empty() {
            return Err(LandscapeError::MalformedInput(format!(
                "header row [{}] does not match the expected schema: {} \
                 (rename the columns, or read them positionally as {})",
                headers.iter().collect::<Vec<_>>().join(", "),
                problems.join("; "),
                CANONICAL_FIELDS.map(|f| f.name()).join(", ")
            )));
        }

        Ok(Self { indices })
    }

    pub fn index(&self, field: Field) -> usize {
        let slot = CANONICAL_FIELDS
            .iter()
            .position(|f| *f == field)
            .unwrap_or(0);
        self.indices[slot]
    }

    /// Pick the canonical fields out of a row, in canonical order.
    /// Cells past the end of a short row come back empty.
    fn project(&self, row: &StringRecord) -> StringRecord {
        let mut projected = StringRecord::with_capacity(64, 5);
        for &idx in &self.indices {
            projected.push_field(row.get(idx).unwrap_or(""));
        }
        projected
    }
}

/// Why a row was dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum RowIssue {
    MissingField(Field),
    InvalidNumber { field: Field, value: String },
}

impl fmt::Display for RowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowIssue::MissingField(field) => write!(f, "missing {}", field),
            RowIssue::InvalidNumber { field, value } => {
                write!(f, "invalid {} '{}'", field, value)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DroppedRow {
    /// 1-based line in the input file
    pub line: u64,
    pub issue: RowIssue,
}

/// Output of the sanitizer: kept records in input order plus what was dropped.
#[derive(Debug, Clone, Default)]
pub struct SanitizeReport {
    pub rows_read: usize,
    pub records: Vec<CleanRecord>,
    pub dropped: Vec<DroppedRow>,
}

/// Decode input bytes as UTF-8 (BOM stripped), falling back to ISO-8859-1.
pub fn decode_input(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        // Latin-1 code points equal their byte values
        Err(_) => Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()),
    }
}

/// Parse a numeric cell. Accepts surrounding whitespace and comma
/// thousands grouping ("1,200"). Non-finite values are rejected and
/// negative zero comes back as zero.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let cleaned: Cow<str> = if GROUPED_NUMBER.is_match(trimmed) {
        Cow::Owned(trimmed.replace(',', ""))
    } else {
        Cow::Borrowed(trimmed)
    };
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v + 0.0)
}

fn required_text(value: Option<String>, field: Field) -> std::result::Result<String, RowIssue> {
    value
        .filter(|s| !s.trim().is_empty())
        .ok_or(RowIssue::MissingField(field))
}

fn required_number(value: Option<String>, field: Field) -> std::result::Result<f64, RowIssue> {
    let text = required_text(value, field)?;
    parse_number(&text)
        .filter(|v| *v >= 0.0)
        .ok_or(RowIssue::InvalidNumber { field, value: text })
}

/// Validate and coerce a single raw row.
pub fn sanitize_record(raw: RawRecord) -> std::result::Result<CleanRecord, RowIssue> {
    let url = required_text(raw.url, Field::Url)?;
    let keyword = required_text(raw.keyword, Field::Keyword)?;
    let blended_rank = required_number(raw.blended_rank, Field::BlendedRank)?;
    let search_volume = required_number(raw.search_volume, Field::SearchVolume)?;
    let cpc = Cpc::parse(raw.cpc.as_deref());

    Ok(CleanRecord {
        url,
        keyword,
        blended_rank,
        search_volume,
        cpc,
    })
}

/// Sanitize an uploaded table held in memory.
pub fn sanitize_bytes(bytes: &[u8], policy: HeaderPolicy) -> Result<SanitizeReport> {
    let text = decode_input(bytes);
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| LandscapeError::MalformedInput(format!("unreadable header row: {}", e)))?
        .clone();
    let mapping = ColumnMapping::resolve(&headers, policy)?;
    debug!("Column mapping: {:?}", mapping);

    let mut report = SanitizeReport::default();

    for result in reader.records() {
        let row = result
            .map_err(|e| LandscapeError::MalformedInput(format!("unreadable row: {}", e)))?;
        report.rows_read += 1;
        let line = row
            .position()
            .map(|p| p.line())
            .unwrap_or(report.rows_read as u64 + 1);

        let raw: RawRecord = mapping.project(&row).deserialize(None)?;
        match sanitize_record(raw) {
            Ok(record) => report.records.push(record),
            Err(issue) => {
                debug!("Line {}: dropped ({})", line, issue);
                report.dropped.push(DroppedRow { line, issue });
            }
        }
    }

    info!(
        "Sanitized {} rows: {} kept, {} dropped",
        report.rows_read,
        report.records.len(),
        report.dropped.len()
    );
    if report.rows_read > 0 && report.dropped.len() * 2 > report.rows_read {
        warn!(
            "More than half of the input rows were dropped ({} of {})",
            report.dropped.len(),
            report.rows_read
        );
    }

    Ok(report)
}

/// Read and sanitize a CSV file.
pub fn sanitize_file(path: &Path, policy: HeaderPolicy) -> Result<SanitizeReport> {
    let bytes = std::fs::read(path)?;
    sanitize_bytes(&bytes, policy)
}
