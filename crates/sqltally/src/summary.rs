//! Summary statistics over a closed captured run.

use std::collections::HashMap;
use std::time::Duration;

use crate::config::ReportConfig;
use crate::interceptor::CapturedRun;
use crate::types::{StatementKind, StatementRecord};

/// Per-kind statement tallies over one captured run.
///
/// Only the four recognized DML kinds are counted; everything else still
/// contributes to [`RunSummary::total`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindCounts {
    /// Number of SELECT queries.
    pub select: usize,
    /// Number of INSERT statements.
    pub insert: usize,
    /// Number of UPDATE statements.
    pub update: usize,
    /// Number of DELETE statements.
    pub delete: usize,
}

impl KindCounts {
    fn bump(&mut self, kind: StatementKind) {
        match kind {
            StatementKind::Select => self.select += 1,
            StatementKind::Insert => self.insert += 1,
            StatementKind::Update => self.update += 1,
            StatementKind::Delete => self.delete += 1,
            StatementKind::Other => {}
        }
    }

    /// Count for one recognized kind (`Other` is always zero).
    pub fn get(&self, kind: StatementKind) -> usize {
        match kind {
            StatementKind::Select => self.select,
            StatementKind::Insert => self.insert,
            StatementKind::Update => self.update,
            StatementKind::Delete => self.delete,
            StatementKind::Other => 0,
        }
    }

    /// Sum across the recognized kinds.
    pub fn recognized_total(&self) -> usize {
        self.select + self.insert + self.update + self.delete
    }
}

/// A group of statements sharing identical normalized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// The shared statement text.
    pub sql: String,
    /// Occurrences within the run.
    pub count: usize,
}

/// A statement whose duration ranked among the slowest of the run.
#[derive(Debug, Clone)]
pub struct SlowStatement {
    /// The statement text.
    pub sql: String,
    /// Measured execution time.
    pub duration: Duration,
}

/// Summary statistics computed once over a closed captured run.
///
/// Owned by a single report generation and discarded after printing.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Per-recognized-kind tallies.
    pub counts: KindCounts,
    /// Groups with more than one occurrence, descending count, ties by
    /// first occurrence.
    pub duplicates: Vec<DuplicateGroup>,
    /// Up to `slowest_count` statements strictly above the slow threshold,
    /// descending duration.
    pub slowest: Vec<SlowStatement>,
    /// Total statements captured, recognized or not.
    pub total: usize,
    /// Wall-clock time of the whole wrapped call.
    pub elapsed: Duration,
}

impl RunSummary {
    /// Compute the summary for a closed run.
    pub fn compute(run: &CapturedRun, config: &ReportConfig) -> Self {
        let mut counts = KindCounts::default();
        for record in &run.records {
            counts.bump(StatementKind::from_sql(&record.sql));
        }

        let duplicates = occurrence_groups(&run.records)
            .into_iter()
            .filter(|group| group.count > 1)
            .collect();

        Self {
            counts,
            duplicates,
            slowest: slowest(&run.records, config),
            total: run.records.len(),
            elapsed: run.elapsed,
        }
    }

    /// Total occurrences across all duplicate groups.
    pub fn duplicate_occurrences(&self) -> usize {
        self.duplicates.iter().map(|group| group.count).sum()
    }
}

/// Group records by exact text, most common first; ties keep
/// first-occurrence order (the sort is stable and groups are built in
/// encounter order).
pub(crate) fn occurrence_groups(records: &[StatementRecord]) -> Vec<DuplicateGroup> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<DuplicateGroup> = Vec::new();
    for record in records {
        match index.get(record.sql.as_str()) {
            Some(&slot) => groups[slot].count += 1,
            None => {
                index.insert(record.sql.as_str(), groups.len());
                groups.push(DuplicateGroup {
                    sql: record.sql.clone(),
                    count: 1,
                });
            }
        }
    }
    groups.sort_by(|a, b| b.count.cmp(&a.count));
    groups
}

/// Rank records by descending duration (stable), truncate to the configured
/// cap, then drop entries at or below the threshold. Truncation happens
/// first: queries beyond the top N never appear even when they exceed the
/// threshold.
fn slowest(records: &[StatementRecord], config: &ReportConfig) -> Vec<SlowStatement> {
    let mut ranked: Vec<&StatementRecord> = records.iter().collect();
    ranked.sort_by(|a, b| b.duration.cmp(&a.duration));
    ranked.truncate(config.slowest_count);
    ranked
        .into_iter()
        .filter(|record| record.duration > config.slow_threshold)
        .map(|record| SlowStatement {
            sql: record.sql.clone(),
            duration: record.duration,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sql: &str, millis: u64) -> StatementRecord {
        StatementRecord {
            sql: sql.to_string(),
            param_count: 0,
            many: false,
            duration: Duration::from_millis(millis),
        }
    }

    fn run(records: Vec<StatementRecord>) -> CapturedRun {
        CapturedRun {
            records,
            elapsed: Duration::from_millis(100),
        }
    }

    #[test]
    fn total_counts_every_record() {
        let summary = RunSummary::compute(
            &run(vec![
                record("SELECT 1", 0),
                record("CREATE TABLE t (id INT)", 0),
                record("TRUNCATE t", 0),
            ]),
            &ReportConfig::default(),
        );
        assert_eq!(summary.total, 3);
        assert_eq!(summary.counts.recognized_total(), 1);
        assert_eq!(summary.counts.select, 1);
    }

    #[test]
    fn counts_by_kind() {
        let summary = RunSummary::compute(
            &run(vec![
                record("SELECT * FROM a", 0),
                record("SELECT * FROM b", 0),
                record("INSERT INTO a (x) VALUES ($1)", 0),
                record("UPDATE a SET x = $1", 0),
                record("DELETE FROM a WHERE x = $1", 0),
                record("WITH c AS (SELECT 1) SELECT * FROM c", 0),
            ]),
            &ReportConfig::default(),
        );
        assert_eq!(summary.counts.select, 3);
        assert_eq!(summary.counts.insert, 1);
        assert_eq!(summary.counts.update, 1);
        assert_eq!(summary.counts.delete, 1);
    }

    #[test]
    fn duplicates_keep_only_repeated_groups() {
        let summary = RunSummary::compute(
            &run(vec![
                record("SELECT 1", 0),
                record("SELECT 2", 0),
                record("SELECT 1", 0),
                record("SELECT 1", 0),
            ]),
            &ReportConfig::default(),
        );
        assert_eq!(summary.duplicates.len(), 1);
        assert_eq!(summary.duplicates[0].sql, "SELECT 1");
        assert_eq!(summary.duplicates[0].count, 3);
        assert_eq!(summary.duplicate_occurrences(), 3);
        assert!(summary.duplicate_occurrences() <= summary.total);
    }

    #[test]
    fn duplicate_ties_keep_first_occurrence_order() {
        let summary = RunSummary::compute(
            &run(vec![
                record("SELECT 'b'", 0),
                record("SELECT 'a'", 0),
                record("SELECT 'b'", 0),
                record("SELECT 'a'", 0),
            ]),
            &ReportConfig::default(),
        );
        let texts: Vec<&str> = summary.duplicates.iter().map(|g| g.sql.as_str()).collect();
        assert_eq!(texts, vec!["SELECT 'b'", "SELECT 'a'"]);
    }

    #[test]
    fn slowest_is_capped_filtered_and_sorted() {
        let config = ReportConfig::default()
            .with_slow_threshold(Duration::from_millis(100))
            .with_slowest_count(2);
        let summary = RunSummary::compute(
            &run(vec![
                record("SELECT 'fast'", 10),
                record("SELECT 'slowest'", 500),
                record("SELECT 'slow'", 300),
                record("SELECT 'also slow, but beyond the cap'", 200),
            ]),
            &config,
        );

        assert_eq!(summary.slowest.len(), 2);
        assert_eq!(summary.slowest[0].sql, "SELECT 'slowest'");
        assert_eq!(summary.slowest[1].sql, "SELECT 'slow'");
        assert!(
            summary
                .slowest
                .windows(2)
                .all(|w| w[0].duration >= w[1].duration)
        );
        assert!(
            summary
                .slowest
                .iter()
                .all(|s| s.duration > config.slow_threshold)
        );
    }

    #[test]
    fn slowest_truncates_before_filtering() {
        // Three statements above the threshold, cap of 2: the third never
        // appears, and fast entries inside the cap are dropped.
        let config = ReportConfig::default()
            .with_slow_threshold(Duration::from_millis(50))
            .with_slowest_count(2);
        let summary = RunSummary::compute(
            &run(vec![
                record("SELECT 'a'", 400),
                record("SELECT 'b'", 300),
                record("SELECT 'c'", 200),
            ]),
            &config,
        );
        assert_eq!(summary.slowest.len(), 2);
        assert!(summary.slowest.iter().all(|s| s.sql != "SELECT 'c'"));
    }

    #[test]
    fn equal_durations_keep_capture_order() {
        let config = ReportConfig::default().with_slow_threshold(Duration::from_millis(1));
        let summary = RunSummary::compute(
            &run(vec![
                record("SELECT 'first'", 100),
                record("SELECT 'second'", 100),
            ]),
            &config,
        );
        assert_eq!(summary.slowest[0].sql, "SELECT 'first'");
        assert_eq!(summary.slowest[1].sql, "SELECT 'second'");
    }

    #[test]
    fn recompute_is_idempotent() {
        let captured = run(vec![
            record("SELECT 1", 5),
            record("SELECT 1", 5),
            record("INSERT INTO t (x) VALUES ($1)", 5),
        ]);
        let config = ReportConfig::default();
        let first = RunSummary::compute(&captured, &config);
        let second = RunSummary::compute(&captured, &config);
        assert_eq!(first.counts, second.counts);
        assert_eq!(first.duplicates, second.duplicates);
        assert_eq!(first.total, second.total);
    }

    #[test]
    fn three_identical_selects() {
        let summary = RunSummary::compute(
            &run(vec![
                record("SELECT 1", 0),
                record("SELECT 1", 0),
                record("SELECT 1", 0),
            ]),
            &ReportConfig::default(),
        );
        assert_eq!(summary.counts.select, 3);
        assert_eq!(summary.duplicates.len(), 1);
        assert_eq!(summary.duplicates[0].count, 3);
        assert!(summary.slowest.is_empty());
    }

    #[test]
    fn empty_run_summarizes_to_zeroes() {
        let summary = RunSummary::compute(&run(vec![]), &ReportConfig::default());
        assert_eq!(summary.total, 0);
        assert_eq!(summary.counts, KindCounts::default());
        assert!(summary.duplicates.is_empty());
        assert!(summary.slowest.is_empty());
    }
}
