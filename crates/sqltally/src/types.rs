//! Captured statement records and statement-kind detection.

use std::sync::OnceLock;
use std::time::Duration;

/// The kind of SQL statement captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    /// SELECT query
    Select,
    /// INSERT statement
    Insert,
    /// UPDATE statement
    Update,
    /// DELETE statement
    Delete,
    /// Other SQL (e.g., DDL, custom)
    Other,
}

impl StatementKind {
    /// The recognized DML kinds, in summary-column order.
    pub const RECOGNIZED: [StatementKind; 4] = [
        StatementKind::Select,
        StatementKind::Insert,
        StatementKind::Update,
        StatementKind::Delete,
    ];

    /// Detect statement kind from a SQL string.
    ///
    /// Detection reads the words left at parenthesis depth zero, with
    /// comments and quoted literals skipped. Parens wrapping the whole
    /// statement are transparent, and a `WITH ...` chain resolves to the
    /// DML keyword it feeds (CTE bodies are parenthesized, so they never
    /// shadow it).
    pub fn from_sql(sql: &str) -> Self {
        let mut words = TopLevelWords::new(sql);
        let Some(first) = words.next() else {
            return StatementKind::Other;
        };
        if let Some(kind) = Self::from_keyword(first) {
            return kind;
        }
        if first.eq_ignore_ascii_case("WITH") {
            // A WITH that never reaches a DML keyword reads as a query.
            return words
                .find_map(Self::from_keyword)
                .unwrap_or(StatementKind::Select);
        }
        StatementKind::Other
    }

    /// Column/header label for this kind.
    pub fn label(&self) -> &'static str {
        match self {
            StatementKind::Select => "Select",
            StatementKind::Insert => "Insert",
            StatementKind::Update => "Update",
            StatementKind::Delete => "Delete",
            StatementKind::Other => "Other",
        }
    }

    fn from_keyword(word: &str) -> Option<Self> {
        Self::RECOGNIZED
            .into_iter()
            .find(|kind| word.eq_ignore_ascii_case(kind.label()))
    }
}

/// Iterator over the words of a statement that sit at parenthesis depth
/// zero, with comments and quoted literals skipped.
///
/// A `(` seen before the first word is transparent, so a statement wrapped
/// in parens still exposes its leading keyword; after that, a `(` swallows
/// its whole group (CTE bodies, subqueries, value lists).
struct TopLevelWords<'a> {
    rest: &'a str,
    yielded: bool,
}

impl<'a> TopLevelWords<'a> {
    fn new(sql: &'a str) -> Self {
        Self {
            rest: sql,
            yielded: false,
        }
    }
}

impl<'a> Iterator for TopLevelWords<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        loop {
            self.rest = self.rest.trim_start();
            if let Some(after) = self.rest.strip_prefix("--") {
                self.rest = after.split_once('\n').map_or("", |(_, tail)| tail);
            } else if let Some(after) = self.rest.strip_prefix("/*") {
                self.rest = after.split_once("*/").map_or("", |(_, tail)| tail);
            } else if let Some(after) = self.rest.strip_prefix('\'') {
                self.rest = skip_literal(after);
            } else if let Some(after) = self.rest.strip_prefix('(') {
                self.rest = if self.yielded { skip_group(after) } else { after };
            } else if let Some(after) = self.rest.strip_prefix([')', ',', ';']) {
                self.rest = after;
            } else if self.rest.is_empty() {
                return None;
            } else {
                let end = self
                    .rest
                    .find([' ', '\t', '\n', '\r', '(', ')', '\'', ',', ';'])
                    .unwrap_or(self.rest.len());
                let (word, tail) = self.rest.split_at(end);
                self.rest = tail;
                self.yielded = true;
                return Some(word);
            }
        }
    }
}

/// Advance past a quoted literal. `rest` starts just after the opening
/// quote; a doubled quote is an escape, not a terminator.
fn skip_literal(mut rest: &str) -> &str {
    while let Some(pos) = rest.find('\'') {
        rest = &rest[pos + 1..];
        match rest.strip_prefix('\'') {
            Some(after) => rest = after,
            None => return rest,
        }
    }
    ""
}

/// Advance past a parenthesized group. `rest` starts just after the opening
/// paren; nested groups and quoted literals are consumed whole.
fn skip_group(mut rest: &str) -> &str {
    let mut depth = 1usize;
    while depth > 0 {
        match rest.find(['(', ')', '\'']) {
            Some(pos) => {
                let found = rest.as_bytes()[pos];
                rest = &rest[pos + 1..];
                match found {
                    b'(' => depth += 1,
                    b')' => depth -= 1,
                    _ => rest = skip_literal(rest),
                }
            }
            None => return "",
        }
    }
    rest
}

/// Collapse parenthesized runs of three or more positional placeholders
/// (`($1, $2, $3, ...)`, the bulk-INSERT shape) to the fixed `($1, ..., $n)`
/// form, so duplicate grouping treats differently sized batches of an
/// otherwise-identical statement as the same statement shape.
///
/// Applied to the stored text only; execution inputs are untouched.
pub(crate) fn normalize_placeholders(sql: &str) -> String {
    static PLACEHOLDER_RUN: OnceLock<regex::Regex> = OnceLock::new();
    let re = PLACEHOLDER_RUN.get_or_init(|| {
        regex::Regex::new(r"\(\s*\$\d+\s*(?:,\s*\$\d+\s*){2,}\)")
            .expect("invalid built-in placeholder regex")
    });
    re.replace_all(sql, "($$1, ..., $$n)").into_owned()
}

/// Cut a SQL string down to at most `max_bytes`, never splitting a
/// character: the first char that would cross the limit ends the slice.
#[cfg(feature = "tracing")]
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    match sql
        .char_indices()
        .find(|(i, c)| i + c.len_utf8() > max_bytes)
    {
        Some((i, _)) => &sql[..i],
        None => sql,
    }
}

/// One captured statement execution.
///
/// Created exactly once per execution and never mutated afterwards.
/// Parameters are opaque to the library; only their count is retained.
#[derive(Debug, Clone)]
pub struct StatementRecord {
    /// Statement text as submitted, after placeholder-run normalization.
    pub sql: String,
    /// Number of bound parameters.
    pub param_count: usize,
    /// Batch-execution flag.
    pub many: bool,
    /// Wall-clock time to execute.
    pub duration: Duration,
}
