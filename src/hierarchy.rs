//! Site-section hierarchy derived from a URL.
//!
//! Level 0 is the domain label and levels 1..k are the path segments, each
//! turned into a readable label: `https://www.example.com/blog/seo-tips/`
//! becomes `L0 = "Example"`, `L1 = "Blog"`, `L2 = "Seo tips"`.

use log::debug;
use std::fmt;
use url::{ParseError, Url};

/// Ordered labels indexed by level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hierarchy {
    levels: Vec<String>,
}

impl Hierarchy {
    pub fn new(levels: Vec<String>) -> Self {
        Self { levels }
    }

    /// Number of levels, including the domain level.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level(&self, level: usize) -> Option<&str> {
        self.levels.get(level).map(String::as_str)
    }

    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    /// Column title for a level ("L0", "L1", ...).
    pub fn column_name(level: usize) -> String {
        format!("L{}", level)
    }
}

/// Why a URL produced no hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlIssue {
    Unparsable(String),
    NoHost,
}

impl fmt::Display for UrlIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlIssue::Unparsable(reason) => write!(f, "unparsable URL: {}", reason),
            UrlIssue::NoHost => f.write_str("URL has no host"),
        }
    }
}

/// Result of hierarchy extraction. Both variants are successes: a URL that
/// cannot be decomposed still yields a row, just with no levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HierarchyOutcome {
    Breakdown(Hierarchy),
    Empty(UrlIssue),
}

impl HierarchyOutcome {
    pub fn into_hierarchy(self) -> Hierarchy {
        match self {
            HierarchyOutcome::Breakdown(hierarchy) => hierarchy,
            HierarchyOutcome::Empty(_) => Hierarchy::default(),
        }
    }

    pub fn issue(&self) -> Option<&UrlIssue> {
        match self {
            HierarchyOutcome::Breakdown(_) => None,
            HierarchyOutcome::Empty(issue) => Some(issue),
        }
    }
}

/// Uppercase the first character and lowercase the rest.
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Domain label: drop a leading `www.`, keep what precedes the next dot.
///
/// Punycode hosts are shown in their Unicode form (`xn--bcher-kva.de` is
/// labeled "Bücher").
pub fn domain_label(host: &str) -> String {
    let (unicode, result) = idna::domain_to_unicode(host);
    let lower = match result {
        Ok(()) => unicode.to_lowercase(),
        Err(_) => host.to_lowercase(),
    };
    let host = lower.strip_prefix("www.").unwrap_or(&lower);
    let name = host.split('.').next().unwrap_or(host);
    capitalize(name)
}

/// Path segment label: percent-decoded, hyphens to spaces, capitalized.
pub fn segment_label(segment: &str) -> String {
    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    capitalize(&decoded.replace('-', " "))
}

/// Base for path-only URLs. Its host never reaches a label.
const RELATIVE_BASE: &str = "http://relative.invalid/";

/// A parsed URL, flagged when the input carried no network location.
struct ParsedUrl {
    url: Url,
    path_only: bool,
}

/// Scheme-less URLs such as `www.example.com/blog` are retried as https;
/// path-only URLs such as `/blog/seo-tips` are resolved against a
/// placeholder base.
fn parse_url(raw: &str) -> Result<ParsedUrl, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::EmptyHost);
    }
    match Url::parse(trimmed) {
        Ok(url) => Ok(ParsedUrl {
            url,
            path_only: false,
        }),
        Err(ParseError::RelativeUrlWithoutBase) if looks_like_host(trimmed) => {
            Url::parse(&format!("https://{}", trimmed)).map(|url| ParsedUrl {
                url,
                path_only: false,
            })
        }
        Err(ParseError::RelativeUrlWithoutBase) => {
            let url = Url::parse(RELATIVE_BASE)?.join(trimmed)?;
            Ok(ParsedUrl {
                url,
                // "//host/path" is scheme-relative and names a real host
                path_only: !trimmed.starts_with("//"),
            })
        }
        Err(e) => Err(e),
    }
}

fn looks_like_host(raw: &str) -> bool {
    let first = raw.split('/').next().unwrap_or("");
    !first.is_empty() && first.contains('.') && !first.starts_with('.')
}

/// Decompose a URL into its hierarchy levels.
///
/// Path-only URLs get an empty domain label at level 0. Dot segments are
/// resolved the way a browser would (`/a/../b` is `/b`).
pub fn extract_hierarchy(raw: &str) -> HierarchyOutcome {
    let parsed = match parse_url(raw) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!("No hierarchy for '{}': {}", raw, e);
            return HierarchyOutcome::Empty(UrlIssue::Unparsable(e.to_string()));
        }
    };

    let domain = if parsed.path_only {
        String::new()
    } else {
        let Some(host) = parsed.url.host_str() else {
            debug!("No hierarchy for '{}': no host", raw);
            return HierarchyOutcome::Empty(UrlIssue::NoHost);
        };
        domain_label(host)
    };

    let mut levels = vec![domain];
    if let Some(segments) = parsed.url.path_segments() {
        levels.extend(segments.filter(|s| !s.is_empty()).map(segment_label));
    }

    HierarchyOutcome::Breakdown(Hierarchy::new(levels))
}
