//! Rendering a captured run as a terminal report.
//!
//! Line order is fixed: detail section (verbose or terse, never both), then
//! the colorized summary table, then the target identifier line. The whole
//! report goes out in one atomic write so interleaved logging cannot split
//! it.

use std::fmt;
use std::io::Write;

use colored::{Color, Colorize};
use comfy_table::{Attribute, Cell, ContentArrangement, Table, presets};

use crate::config::{ReportConfig, SeverityMetric, TablePreset};
use crate::highlight::prettify;
use crate::interceptor::CapturedRun;
use crate::summary::{RunSummary, occurrence_groups};
use crate::types::StatementKind;

/// Identifies the wrapped call a report belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RunTarget {
    /// A plain callable, labeled by module path or function name.
    Callable(String),
    /// A request handler: request path plus resolved handler name.
    Handler {
        /// The request path.
        path: String,
        /// The resolved handler name.
        name: String,
    },
    /// Label resolution failed; the generic fallback.
    #[default]
    Unlabeled,
}

impl RunTarget {
    /// Label a run by callable name or module path.
    pub fn callable(label: impl Into<String>) -> Self {
        Self::Callable(label.into())
    }

    /// Label a run by request path and handler name.
    pub fn handler(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Handler {
            path: path.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RunTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunTarget::Callable(label) => write!(f, "{label}"),
            RunTarget::Handler { path, name } => write!(f, "{path} {name}"),
            RunTarget::Unlabeled => write!(f, "<unknown target>"),
        }
    }
}

/// Choose the severity color for a count: the first tier whose inclusive
/// bound the count does not exceed wins; above every bound, the last tier's
/// color.
pub(crate) fn severity_color(count: u64, tiers: &[(u64, Color)]) -> Color {
    for (bound, color) in tiers {
        if count <= *bound {
            return *color;
        }
    }
    tiers.last().map(|(_, color)| *color).unwrap_or(Color::White)
}

/// Render the full report as lines, in output order.
///
/// Rendering never fails: an empty run yields no detail lines and an
/// all-zero summary row.
pub fn render(
    run: &CapturedRun,
    summary: &RunSummary,
    target: &RunTarget,
    config: &ReportConfig,
) -> Vec<String> {
    let mut lines = Vec::new();
    if config.print_all_queries {
        render_all_queries(&mut lines, run, config);
    } else {
        render_detailed(&mut lines, summary, config);
    }
    render_summary_table(&mut lines, summary, config);
    lines.push(format!("Target: {target}"));
    lines
}

/// Render and emit the report in one atomic write to stdout.
///
/// Write errors are swallowed: reporting must never change the wrapped
/// call's outcome.
pub fn print(run: &CapturedRun, summary: &RunSummary, target: &RunTarget, config: &ReportConfig) {
    let mut out = String::new();
    for line in render(run, summary, target, config) {
        out.push_str(&line);
        out.push('\n');
    }
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    let _ = handle.write_all(out.as_bytes());
    let _ = handle.flush();
}

/// Verbose detail: every distinct statement with its occurrence count, most
/// common first.
fn render_all_queries(lines: &mut Vec<String>, run: &CapturedRun, config: &ReportConfig) {
    for group in occurrence_groups(&run.records) {
        lines.push(format!(
            "{}: {}",
            group.count.to_string().yellow().bold(),
            prettify(&group.sql, config)
        ));
    }
}

/// Terse detail: duplicate groups, then slow queries.
fn render_detailed(lines: &mut Vec<String>, summary: &RunSummary, config: &ReportConfig) {
    if !summary.duplicates.is_empty() {
        lines.push("Duplicate queries:".white().bold().to_string());
        for group in summary.duplicates.iter().take(config.duplicates_count) {
            lines.push(format!(
                "{}: {}",
                group.count.to_string().yellow().bold(),
                prettify(&group.sql, config)
            ));
        }
    }
    if !summary.slowest.is_empty() {
        lines.push("Slowest queries:".white().bold().to_string());
        for slow in &summary.slowest {
            lines.push(format!(
                "{}: {}",
                format!("{:.2}", slow.duration.as_secs_f64()).red().bold(),
                prettify(&slow.sql, config)
            ));
        }
    }
}

fn render_summary_table(lines: &mut Vec<String>, summary: &RunSummary, config: &ReportConfig) {
    let metric = match config.severity_metric {
        SeverityMetric::Occurrences => summary.duplicate_occurrences(),
        SeverityMetric::Groups => summary.duplicates.len(),
    };
    let color = severity_color(metric as u64, &config.severity_tiers);

    let mut table = Table::new();
    table
        .load_preset(match config.table_preset {
            TablePreset::Utf8Full => presets::UTF8_FULL,
            TablePreset::AsciiFull => presets::ASCII_FULL,
        })
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            StatementKind::RECOGNIZED
                .iter()
                .map(|kind| kind.label().to_string())
                .chain(["Duplicates".into(), "Total".into(), "Duration".into()])
                .map(|label| Cell::new(label).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
    table.add_row(
        StatementKind::RECOGNIZED
            .iter()
            .map(|kind| summary.counts.get(*kind).to_string())
            .chain([
                summary.duplicate_occurrences().to_string(),
                summary.total.to_string(),
                format!("{:.2}", summary.elapsed.as_secs_f64()),
            ])
            .map(Cell::new)
            .collect::<Vec<_>>(),
    );

    for line in table.to_string().lines() {
        lines.push(line.color(color).bold().to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StatementRecord;
    use std::sync::Mutex;
    use std::time::Duration;

    // Colorization is process-global; tests that force it on, and tests
    // whose substring assertions would break under forced color codes,
    // serialize here.
    static COLOR_LOCK: Mutex<()> = Mutex::new(());

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
            elapsed: Duration::from_millis(1500),
        }
    }

    fn render_run(records: Vec<StatementRecord>, config: &ReportConfig) -> Vec<String> {
        let captured = run(records);
        let summary = RunSummary::compute(&captured, config);
        render(&captured, &summary, &RunTarget::callable("api::list"), config)
    }

    #[test]
    fn severity_tiers_first_unexceeded_bound_wins() {
        let tiers = vec![
            (5, Color::Green),
            (10, Color::White),
            (20, Color::Yellow),
            (30, Color::Red),
        ];
        assert_eq!(severity_color(0, &tiers), Color::Green);
        assert_eq!(severity_color(5, &tiers), Color::Green);
        assert_eq!(severity_color(6, &tiers), Color::White);
        assert_eq!(severity_color(20, &tiers), Color::Yellow);
        assert_eq!(severity_color(21, &tiers), Color::Red);
    }

    #[test]
    fn severity_above_all_bounds_falls_back_to_last_color() {
        let tiers = vec![(5, Color::Green), (10, Color::Red)];
        assert_eq!(severity_color(1000, &tiers), Color::Red);
        assert_eq!(severity_color(0, &[]), Color::White);
    }

    #[test]
    fn empty_run_still_renders_table_without_detail() {
        let lines = render_run(vec![], &ReportConfig::default());
        let joined = lines.join("\n");
        assert!(!joined.contains("Duplicate queries:"));
        assert!(!joined.contains("Slowest queries:"));
        assert!(joined.contains("Duplicates"));
        assert!(joined.contains("Total"));
        // Elapsed still shows, formatted to two decimals.
        assert!(joined.contains("1.50"));
        assert!(lines.last().unwrap().contains("Target: api::list"));
    }

    #[test]
    fn terse_report_lists_duplicates_and_slowest() {
        let _guard = COLOR_LOCK.lock().unwrap();
        let config = ReportConfig::default();
        let lines = render_run(
            vec![
                record("SELECT 1", 0),
                record("SELECT 1", 0),
                record("SELECT 1", 0),
                record("SELECT pg_sleep(2)", 2000),
            ],
            &config,
        );
        let joined = lines.join("\n");
        assert!(joined.contains("Duplicate queries:"));
        assert!(joined.contains("SELECT 1"));
        assert!(joined.contains("Slowest queries:"));
        assert!(joined.contains("2.00"));
    }

    #[test]
    fn exactly_one_detail_section_is_emitted() {
        let _guard = COLOR_LOCK.lock().unwrap();
        let records = vec![record("SELECT 1", 0), record("SELECT 1", 0)];

        let terse = render_run(records.clone(), &ReportConfig::default());
        let terse_joined = terse.join("\n");
        assert!(terse_joined.contains("Duplicate queries:"));

        let verbose = render_run(records, &ReportConfig::default().print_all(true));
        let verbose_joined = verbose.join("\n");
        assert!(!verbose_joined.contains("Duplicate queries:"));
        assert!(verbose_joined.contains("SELECT 1"));
    }

    #[test]
    fn terse_duplicates_are_capped() {
        let _guard = COLOR_LOCK.lock().unwrap();
        let config = ReportConfig::default().with_duplicates_count(1);
        let lines = render_run(
            vec![
                record("SELECT 'a'", 0),
                record("SELECT 'a'", 0),
                record("SELECT 'a'", 0),
                record("SELECT 'b'", 0),
                record("SELECT 'b'", 0),
            ],
            &config,
        );
        let joined = lines.join("\n");
        // Most common group shows; the second falls beyond the cap.
        assert!(joined.contains("SELECT 'a'"));
        assert!(!joined.contains("SELECT 'b'"));
    }

    #[test]
    fn severity_metric_choice_changes_table_color() {
        let _guard = COLOR_LOCK.lock().unwrap();
        colored::control::set_override(true);

        // Three groups of two: six duplicate occurrences land in the second
        // default tier (white), three groups stay in the first (green).
        let records = vec![
            record("SELECT 'a'", 0),
            record("SELECT 'a'", 0),
            record("SELECT 'b'", 0),
            record("SELECT 'b'", 0),
            record("SELECT 'c'", 0),
            record("SELECT 'c'", 0),
        ];
        let by_occurrences = render_run(records.clone(), &ReportConfig::default());
        let by_groups = render_run(
            records,
            &ReportConfig::default().with_severity_metric(SeverityMetric::Groups),
        );
        colored::control::unset_override();

        // The table sits right above the target line in both reports.
        let occurrences_table = &by_occurrences[by_occurrences.len() - 2];
        let groups_table = &by_groups[by_groups.len() - 2];
        assert_ne!(occurrences_table, groups_table);
        assert!(occurrences_table.contains("37m"));
        assert!(groups_table.contains("32m"));
    }

    #[test]
    fn summary_row_carries_counts() {
        let lines = render_run(
            vec![
                record("SELECT 1", 0),
                record("SELECT 1", 0),
                record("INSERT INTO t (x) VALUES ($1)", 0),
                record("CREATE INDEX idx ON t (x)", 0),
            ],
            &ReportConfig::default(),
        );
        let joined = lines.join("\n");
        // Header and the total column value.
        assert!(joined.contains("Select"));
        assert!(joined.contains("4"));
        assert!(lines.last().unwrap().starts_with("Target:"));
    }

    #[test]
    fn table_is_last_before_target_line() {
        let lines = render_run(vec![record("SELECT 1", 0)], &ReportConfig::default());
        let target_idx = lines.len() - 1;
        assert!(lines[target_idx].contains("Target:"));
        // The line right above the target belongs to the table border.
        assert!(lines[target_idx - 1].contains("─") || lines[target_idx - 1].contains("-"));
    }

    #[test]
    fn target_labels() {
        assert_eq!(RunTarget::callable("app::view").to_string(), "app::view");
        assert_eq!(
            RunTarget::handler("/users", "users::index").to_string(),
            "/users users::index"
        );
        assert_eq!(RunTarget::default().to_string(), "<unknown target>");
    }
}
