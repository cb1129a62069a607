//! Keyword selection: per-URL top-K by composite score, optional global
//! top-K by search volume, de-duplication on (URL, Keyword) and hierarchy
//! annotation.

use crate::error::{LandscapeError, Result};
use crate::hierarchy::{extract_hierarchy, HierarchyOutcome};
use crate::record::{CleanRecord, Origin, ResultRecord, ScoredRecord};
use log::debug;
use std::collections::{BTreeMap, HashSet};

pub const MIN_KEYWORD_LIMIT: usize = 1;
pub const MAX_KEYWORD_LIMIT: usize = 25;
pub const DEFAULT_KEYWORD_LIMIT: usize = 5;

/// Maximum keywords kept per URL, always within [1, 25].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordLimit(usize);

impl KeywordLimit {
    pub fn new(limit: usize) -> Result<Self> {
        if (MIN_KEYWORD_LIMIT..=MAX_KEYWORD_LIMIT).contains(&limit) {
            Ok(Self(limit))
        } else {
            Err(LandscapeError::InvalidParameter(format!(
                "keyword limit must be between {} and {}, got {}",
                MIN_KEYWORD_LIMIT, MAX_KEYWORD_LIMIT, limit
            )))
        }
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for KeywordLimit {
    fn default() -> Self {
        Self(DEFAULT_KEYWORD_LIMIT)
    }
}

/// Selection parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionConfig {
    pub keyword_limit: KeywordLimit,
    /// Union in the top-K keywords by search volume across all URLs
    pub include_top_search_volume: bool,
}

impl SelectionConfig {
    pub fn with_limit(mut self, limit: KeywordLimit) -> Self {
        self.keyword_limit = limit;
        self
    }

    pub fn with_top_volume(mut self, enabled: bool) -> Self {
        self.include_top_search_volume = enabled;
        self
    }
}

/// A record picked for output, before de-duplication.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub record: &'a CleanRecord,
    pub origin: Origin,
}

/// Largest search volume in the whole dataset (0 when empty).
pub fn max_search_volume(records: &[CleanRecord]) -> f64 {
    records
        .iter()
        .map(|r| r.search_volume)
        .fold(0.0, f64::max)
}

/// Group records by exact URL string. Partitions iterate in URL order and
/// keep input order inside.
pub fn partition_by_url(records: &[CleanRecord]) -> BTreeMap<&str, Vec<&CleanRecord>> {
    let mut partitions: BTreeMap<&str, Vec<&CleanRecord>> = BTreeMap::new();
    for record in records {
        partitions.entry(record.url.as_str()).or_default().push(record);
    }
    partitions
}

/// Score a partition and keep the best `limit`, ties in input order.
pub fn rank_partition<'a>(
    partition: &[&'a CleanRecord],
    max_volume: f64,
    limit: KeywordLimit,
) -> Vec<ScoredRecord<'a>> {
    let mut scored: Vec<ScoredRecord<'a>> = partition
        .iter()
        .map(|&record| ScoredRecord {
            record,
            score: record.score(max_volume),
        })
        .collect();
    // sort_by is stable
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(limit.get());
    scored
}

/// Top `limit` records by search volume across the dataset, ties in input order.
pub fn top_by_search_volume(records: &[CleanRecord], limit: KeywordLimit) -> Vec<&CleanRecord> {
    let mut by_volume: Vec<&CleanRecord> = records.iter().collect();
    by_volume.sort_by(|a, b| b.search_volume.total_cmp(&a.search_volume));
    by_volume.truncate(limit.get());
    by_volume
}

/// Per-URL selections in partition order, followed by the global
/// top-volume picks when enabled. May contain duplicates.
pub fn candidates<'a>(records: &'a [CleanRecord], config: &SelectionConfig) -> Vec<Candidate<'a>> {
    let max_volume = max_search_volume(records);
    let partitions = partition_by_url(records);
    debug!(
        "{} URLs, max search volume {}",
        partitions.len(),
        max_volume
    );

    let mut picked: Vec<Candidate<'a>> = partitions
        .values()
        .flat_map(|partition| rank_partition(partition, max_volume, config.keyword_limit))
        .map(|scored| Candidate {
            record: scored.record,
            origin: Origin::PerUrl,
        })
        .collect();

    if config.include_top_search_volume {
        picked.extend(
            top_by_search_volume(records, config.keyword_limit)
                .into_iter()
                .map(|record| Candidate {
                    record,
                    origin: Origin::TopVolume,
                }),
        );
    }

    picked
}

/// Drop repeated (URL, Keyword) pairs, keeping the first occurrence.
pub fn dedup_candidates<'a>(
    candidates: impl IntoIterator<Item = Candidate<'a>>,
) -> impl Iterator<Item = Candidate<'a>> {
    let mut seen: HashSet<(&'a str, &'a str)> = HashSet::new();
    candidates.into_iter().filter(move |c| {
        let record: &'a CleanRecord = c.record;
        seen.insert((record.url.as_str(), record.keyword.as_str()))
    })
}

/// Attach the URL hierarchy to a selected record.
pub fn annotate(candidate: Candidate<'_>) -> ResultRecord {
    let outcome = extract_hierarchy(&candidate.record.url);
    if let HierarchyOutcome::Empty(issue) = &outcome {
        debug!(
            "Keyword '{}' on '{}' has an empty hierarchy ({})",
            candidate.record.keyword, candidate.record.url, issue
        );
    }
    ResultRecord {
        record: candidate.record.clone(),
        hierarchy: outcome.into_hierarchy(),
        origin: candidate.origin,
    }
}

/// Select and annotate. Result records are produced lazily; nothing is
/// materialized beyond the candidate list.
pub fn select_keywords<'a>(
    records: &'a [CleanRecord],
    config: &SelectionConfig,
) -> impl Iterator<Item = ResultRecord> + 'a {
    dedup_candidates(candidates(records, config)).map(annotate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Cpc;

    fn rec(url: &str, keyword: &str, rank: f64, volume: f64) -> CleanRecord {
        CleanRecord {
            url: url.to_string(),
            keyword: keyword.to_string(),
            blended_rank: rank,
            search_volume: volume,
            cpc: Cpc::NotAvailable,
        }
    }

    fn limit(n: usize) -> KeywordLimit {
        KeywordLimit::new(n).unwrap()
    }

    fn keywords(rows: &[ResultRecord]) -> Vec<&str> {
        rows.iter().map(|r| r.keyword()).collect()
    }

    #[test]
    fn test_keyword_limit_bounds() {
        assert!(KeywordLimit::new(0).is_err());
        assert!(KeywordLimit::new(26).is_err());
        assert_eq!(KeywordLimit::new(1).unwrap().get(), 1);
        assert_eq!(KeywordLimit::new(25).unwrap().get(), 25);
        assert_eq!(KeywordLimit::default().get(), 5);

        let config = SelectionConfig::default();
        assert_eq!(config.keyword_limit.get(), 5);
        assert!(!config.include_top_search_volume);
    }

    #[test]
    fn test_max_search_volume() {
        assert_eq!(max_search_volume(&[]), 0.0);
        let records = vec![rec("/a", "x", 1.0, 10.0), rec("/b", "y", 1.0, 70.0)];
        assert_eq!(max_search_volume(&records), 70.0);
    }

    #[test]
    fn test_per_url_count_is_min_of_limit_and_partition() {
        let records: Vec<CleanRecord> = (0..7)
            .map(|i| rec("/a", &format!("a{}", i), i as f64 + 1.0, 10.0))
            .chain((0..2).map(|i| rec("/b", &format!("b{}", i), 1.0, 10.0)))
            .collect();
        let config = SelectionConfig::default().with_limit(limit(3));
        let rows: Vec<ResultRecord> = select_keywords(&records, &config).collect();

        assert_eq!(rows.iter().filter(|r| r.url() == "/a").count(), 3);
        assert_eq!(rows.iter().filter(|r| r.url() == "/b").count(), 2);
    }

    #[test]
    fn test_partition_sorted_by_score_then_input_order() {
        let records = vec![
            rec("/a", "tie-first", 4.0, 0.0),
            rec("/a", "best", 1.0, 100.0),
            rec("/a", "tie-second", 4.0, 0.0),
        ];
        let config = SelectionConfig::default();
        let rows: Vec<ResultRecord> = select_keywords(&records, &config).collect();
        assert_eq!(keywords(&rows), vec!["best", "tie-first", "tie-second"]);
    }

    #[test]
    fn test_zero_volume_dataset_ranks_by_rank() {
        let records = vec![rec("/a", "second", 2.0, 0.0), rec("/a", "first", 1.0, 0.0)];
        let config = SelectionConfig::default().with_limit(limit(1));
        let rows: Vec<ResultRecord> = select_keywords(&records, &config).collect();
        assert_eq!(keywords(&rows), vec!["first"]);
    }

    #[test]
    fn test_max_volume_is_global_not_per_partition() {
        // Against the global max (1000) the volume term is tiny, so rank wins;
        // a per-partition max (20) would have picked "volume".
        let records = vec![
            rec("/a", "volume", 3.0, 20.0),
            rec("/a", "rank", 1.0, 1.0),
            rec("/b", "big", 1.0, 1000.0),
        ];
        let config = SelectionConfig::default().with_limit(limit(1));
        let rows: Vec<ResultRecord> = select_keywords(&records, &config).collect();
        assert_eq!(keywords(&rows), vec!["rank", "big"]);
    }

    #[test]
    fn test_partitions_iterate_in_url_order() {
        let records = vec![rec("/b", "kb", 1.0, 1.0), rec("/a", "ka", 1.0, 1.0)];
        let rows: Vec<ResultRecord> =
            select_keywords(&records, &SelectionConfig::default()).collect();
        assert_eq!(keywords(&rows), vec!["ka", "kb"]);
    }

    #[test]
    fn test_url_grouping_is_exact() {
        let records = vec![
            rec("https://example.com/a", "k1", 1.0, 1.0),
            rec("https://example.com/a/", "k2", 1.0, 1.0),
            rec("https://Example.com/a", "k3", 1.0, 1.0),
        ];
        let config = SelectionConfig::default().with_limit(limit(1));
        let rows: Vec<ResultRecord> = select_keywords(&records, &config).collect();
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_top_volume_appended_after_per_url() {
        let records = vec![
            rec("/a", "a-rank", 1.0, 10.0),
            rec("/a", "a-volume", 50.0, 500.0),
            rec("/b", "b-only", 1.0, 5.0),
        ];
        let config = SelectionConfig::default()
            .with_limit(limit(1))
            .with_top_volume(true);
        let rows: Vec<ResultRecord> = select_keywords(&records, &config).collect();

        assert_eq!(keywords(&rows), vec!["a-volume", "b-only"]);
        assert!(rows.iter().all(|r| r.origin == Origin::PerUrl));

        let records = vec![
            rec("/a", "a-rank", 1.0, 400.0),
            rec("/a", "a-volume", 50.0, 500.0),
            rec("/b", "b-only", 1.0, 5.0),
        ];
        let rows: Vec<ResultRecord> = select_keywords(&records, &config).collect();
        assert_eq!(keywords(&rows), vec!["a-rank", "b-only", "a-volume"]);
        assert_eq!(rows[2].origin, Origin::TopVolume);
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let records = vec![
            rec("/a", "shared", 1.0, 100.0),
            rec("/a", "shared", 2.0, 90.0),
            rec("/b", "shared", 1.0, 80.0),
        ];
        let config = SelectionConfig::default().with_top_volume(true);
        let rows: Vec<ResultRecord> = select_keywords(&records, &config).collect();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].url(), "/a");
        assert_eq!(rows[0].record.blended_rank, 1.0);
        assert_eq!(rows[1].url(), "/b");

        let pairs: HashSet<(&str, &str)> = rows.iter().map(|r| (r.url(), r.keyword())).collect();
        assert_eq!(pairs.len(), rows.len());
    }

    #[test]
    fn test_top_by_search_volume_stable() {
        let records = vec![
            rec("/a", "x", 1.0, 10.0),
            rec("/b", "y", 1.0, 30.0),
            rec("/c", "z", 1.0, 10.0),
        ];
        let top: Vec<&str> = top_by_search_volume(&records, limit(3))
            .iter()
            .map(|r| r.keyword.as_str())
            .collect();
        assert_eq!(top, vec!["y", "x", "z"]);
    }

    #[test]
    fn test_annotation_attached() {
        let records = vec![
            rec("https://www.example.com/blog/seo-tips/", "seo", 1.0, 1.0),
            rec("/relative", "rel", 1.0, 1.0),
        ];
        let rows: Vec<ResultRecord> =
            select_keywords(&records, &SelectionConfig::default()).collect();
        // "/relative" sorts before "https://..."
        assert_eq!(
            rows[0].hierarchy.levels(),
            &["".to_string(), "Relative".to_string()]
        );
        assert_eq!(
            rows[1].hierarchy.levels(),
            &["Example".to_string(), "Blog".to_string(), "Seo tips".to_string()]
        );
    }
}
