//! Report configuration with file and environment overrides.
//!
//! [`ReportConfig::default`] carries the documented defaults;
//! [`ReportConfig::load`] overlays an optional `sqltally.toml` file and then
//! `SQLTALLY_*` environment variables on top of them.

use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use colored::Color;
use serde::Deserialize;

use crate::error::{TallyError, TallyResult};

/// Which count drives severity coloring of the summary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityMetric {
    /// Total occurrences across all duplicate groups.
    Occurrences,
    /// Number of distinct duplicate groups.
    Groups,
}

impl FromStr for SeverityMetric {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "occurrences" => Ok(Self::Occurrences),
            "groups" => Ok(Self::Groups),
            other => Err(TallyError::config(
                "severity_metric",
                format!("expected \"occurrences\" or \"groups\", got {other:?}"),
            )),
        }
    }
}

/// Named keyword-highlight styles for SQL in report detail sections.
///
/// `Plain` always passes text through untouched; the colorized styles fall
/// back to plain when the `highlight` feature is compiled out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightStyle {
    /// No keyword coloring.
    Plain,
    /// Bold cyan keywords.
    Vivid,
    /// Blue keywords, no bold.
    Muted,
}

impl FromStr for HighlightStyle {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" => Ok(Self::Plain),
            "vivid" => Ok(Self::Vivid),
            "muted" => Ok(Self::Muted),
            other => Err(TallyError::config(
                "highlight_style",
                format!("expected \"plain\", \"vivid\" or \"muted\", got {other:?}"),
            )),
        }
    }
}

/// Summary-table border preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TablePreset {
    /// UTF-8 box drawing (default).
    Utf8Full,
    /// ASCII-only borders, for terminals without box-drawing glyphs.
    AsciiFull,
}

impl FromStr for TablePreset {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf8_full" => Ok(Self::Utf8Full),
            "ascii_full" => Ok(Self::AsciiFull),
            other => Err(TallyError::config(
                "table_preset",
                format!("expected \"utf8_full\" or \"ascii_full\", got {other:?}"),
            )),
        }
    }
}

/// Configuration for summarizing and rendering a captured run.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Duration above which a statement counts as slow.
    pub slow_threshold: Duration,
    /// Maximum slow queries shown.
    pub slowest_count: usize,
    /// Maximum duplicate groups shown in the terse detail section.
    pub duplicates_count: usize,
    /// Reindent SQL in detail sections.
    pub reindent_sql: bool,
    /// Keyword-highlight style for SQL in detail sections.
    pub highlight_style: HighlightStyle,
    /// Print every distinct statement (verbose) instead of the
    /// duplicates-and-slowest detail.
    pub print_all_queries: bool,
    /// Which duplicate count drives severity coloring.
    pub severity_metric: SeverityMetric,
    /// Ordered `(inclusive upper bound, color)` severity tiers.
    pub severity_tiers: Vec<(u64, Color)>,
    /// Summary-table border preset.
    pub table_preset: TablePreset,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            slow_threshold: Duration::from_secs(1),
            slowest_count: 5,
            duplicates_count: 10,
            reindent_sql: true,
            highlight_style: HighlightStyle::Vivid,
            print_all_queries: false,
            severity_metric: SeverityMetric::Occurrences,
            severity_tiers: vec![
                (5, Color::Green),
                (10, Color::White),
                (20, Color::Yellow),
                (30, Color::Red),
            ],
            table_preset: TablePreset::Utf8Full,
        }
    }
}

impl ReportConfig {
    /// Create a configuration with the documented defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the configuration: defaults, then an optional `sqltally.toml`
    /// file (path overridable via `SQLTALLY_CONFIG`), then `SQLTALLY_*`
    /// environment variables.
    pub fn load() -> TallyResult<Self> {
        let mut config = Self::default();
        let path = env::var("SQLTALLY_CONFIG").unwrap_or_else(|_| "sqltally.toml".to_string());
        if Path::new(&path).exists() {
            let raw = std::fs::read_to_string(&path)
                .map_err(|e| TallyError::config_file(format!("failed to read {path}: {e}")))?;
            config.apply_file_str(&raw)?;
        }
        config.apply_env()?;
        Ok(config)
    }

    /// Set the slow-query threshold.
    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = threshold;
        self
    }

    /// Set the maximum number of slow queries shown.
    pub fn with_slowest_count(mut self, count: usize) -> Self {
        self.slowest_count = count;
        self
    }

    /// Set the maximum number of duplicate groups shown in terse mode.
    pub fn with_duplicates_count(mut self, count: usize) -> Self {
        self.duplicates_count = count;
        self
    }

    /// Toggle SQL reindentation in detail sections.
    pub fn reindent(mut self, on: bool) -> Self {
        self.reindent_sql = on;
        self
    }

    /// Set the keyword-highlight style.
    pub fn with_style(mut self, style: HighlightStyle) -> Self {
        self.highlight_style = style;
        self
    }

    /// Print every distinct statement instead of the terse detail sections.
    pub fn print_all(mut self, on: bool) -> Self {
        self.print_all_queries = on;
        self
    }

    /// Set which duplicate count drives severity coloring.
    pub fn with_severity_metric(mut self, metric: SeverityMetric) -> Self {
        self.severity_metric = metric;
        self
    }

    /// Replace the severity tier table.
    pub fn with_severity_tiers(mut self, tiers: Vec<(u64, Color)>) -> Self {
        self.severity_tiers = tiers;
        self
    }

    /// Set the summary-table border preset.
    pub fn with_table_preset(mut self, preset: TablePreset) -> Self {
        self.table_preset = preset;
        self
    }

    fn apply_file_str(&mut self, raw: &str) -> TallyResult<()> {
        let file: ConfigFile = toml::from_str(raw)
            .map_err(|e| TallyError::config_file(format!("failed to parse config: {e}")))?;
        self.apply_file(file)
    }

    fn apply_file(&mut self, file: ConfigFile) -> TallyResult<()> {
        if let Some(secs) = file.slow_threshold {
            self.slow_threshold = duration_from_secs("slow_threshold", secs)?;
        }
        if let Some(count) = file.slowest_count {
            self.slowest_count = count;
        }
        if let Some(count) = file.duplicates_count {
            self.duplicates_count = count;
        }
        if let Some(on) = file.reindent_sql {
            self.reindent_sql = on;
        }
        if let Some(style) = file.highlight_style {
            self.highlight_style = style;
        }
        if let Some(on) = file.print_all_queries {
            self.print_all_queries = on;
        }
        if let Some(metric) = file.severity_metric {
            self.severity_metric = metric;
        }
        if let Some(tiers) = file.severity_tiers {
            self.severity_tiers = tiers
                .into_iter()
                .map(|tier| Ok((tier.upto, parse_color(&tier.color)?)))
                .collect::<TallyResult<Vec<_>>>()?;
        }
        if let Some(preset) = file.table_preset {
            self.table_preset = preset;
        }
        Ok(())
    }

    fn apply_env(&mut self) -> TallyResult<()> {
        if let Some(secs) = env_parse::<f64>("SQLTALLY_SLOW_THRESHOLD")? {
            self.slow_threshold = duration_from_secs("SQLTALLY_SLOW_THRESHOLD", secs)?;
        }
        if let Some(count) = env_parse::<usize>("SQLTALLY_SLOWEST_COUNT")? {
            self.slowest_count = count;
        }
        if let Some(count) = env_parse::<usize>("SQLTALLY_DUPLICATES_COUNT")? {
            self.duplicates_count = count;
        }
        if let Some(on) = env_bool("SQLTALLY_REINDENT")? {
            self.reindent_sql = on;
        }
        if let Some(on) = env_bool("SQLTALLY_PRINT_ALL")? {
            self.print_all_queries = on;
        }
        if let Ok(style) = env::var("SQLTALLY_STYLE") {
            self.highlight_style = style.parse()?;
        }
        if let Ok(metric) = env::var("SQLTALLY_SEVERITY_METRIC") {
            self.severity_metric = metric.parse()?;
        }
        if let Ok(preset) = env::var("SQLTALLY_TABLE_PRESET") {
            self.table_preset = preset.parse()?;
        }
        Ok(())
    }
}

/// Optional-field overlay read from `sqltally.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    slow_threshold: Option<f64>,
    slowest_count: Option<usize>,
    duplicates_count: Option<usize>,
    reindent_sql: Option<bool>,
    highlight_style: Option<HighlightStyle>,
    print_all_queries: Option<bool>,
    severity_metric: Option<SeverityMetric>,
    severity_tiers: Option<Vec<TierSpec>>,
    table_preset: Option<TablePreset>,
}

#[derive(Debug, Clone, Deserialize)]
struct TierSpec {
    upto: u64,
    color: String,
}

fn duration_from_secs(key: &str, secs: f64) -> TallyResult<Duration> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(TallyError::config(
            key,
            format!("expected a non-negative number of seconds, got {secs}"),
        ));
    }
    Ok(Duration::from_secs_f64(secs))
}

fn parse_color(name: &str) -> TallyResult<Color> {
    name.parse::<Color>().map_err(|_| {
        TallyError::config("severity_tiers", format!("unknown color name {name:?}"))
    })
}

fn env_parse<T: FromStr>(key: &str) -> TallyResult<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|e| TallyError::config(key, e.to_string())),
        Err(_) => Ok(None),
    }
}

fn env_bool(key: &str) -> TallyResult<Option<bool>> {
    match env::var(key) {
        Ok(value) => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            other => Err(TallyError::config(
                key,
                format!("expected a boolean, got {other:?}"),
            )),
        },
        Err(_) => Ok(None),
    }
}
