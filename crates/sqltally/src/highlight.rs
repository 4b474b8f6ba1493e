//! SQL prettifying for report detail sections.
//!
//! Reindentation is always available; keyword colorization is compiled in
//! behind the `highlight` feature and falls back to plain text without it.

use crate::config::{HighlightStyle, ReportConfig};

/// Whether keyword highlighting was compiled in (`highlight` feature).
pub const fn highlight_available() -> bool {
    cfg!(feature = "highlight")
}

/// Prepare a statement for display: optional reindentation, then keyword
/// coloring per the configured style.
pub fn prettify(sql: &str, config: &ReportConfig) -> String {
    let text = if config.reindent_sql {
        reindent(sql)
    } else {
        sql.trim().to_string()
    };
    apply_style(&text, config.highlight_style)
}

/// Clause keywords that start a new line.
const BREAK_BEFORE: &[&str] = &[
    "FROM",
    "WHERE",
    "GROUP",
    "ORDER",
    "HAVING",
    "LIMIT",
    "OFFSET",
    "VALUES",
    "SET",
    "RETURNING",
    "UNION",
];

/// JOIN qualifiers that pull the line break in front of themselves.
const JOIN_QUALIFIERS: &[&str] = &["LEFT", "RIGHT", "INNER", "FULL", "OUTER", "CROSS"];

fn reindent(sql: &str) -> String {
    // The whitespace rewrite must never touch literal content, so statements
    // containing quoted literals are left as submitted.
    if sql.contains('\'') {
        return sql.trim().to_string();
    }

    let words: Vec<&str> = sql.split_whitespace().collect();
    let mut out = String::new();
    for (i, word) in words.iter().enumerate() {
        let upper = word.to_ascii_uppercase();
        let breaks = i > 0
            && (BREAK_BEFORE.contains(&upper.as_str())
                || (upper == "JOIN" && !prev_is_join_qualifier(&words, i))
                || (JOIN_QUALIFIERS.contains(&upper.as_str())
                    && !prev_is_join_qualifier(&words, i)
                    && leads_to_join(&words, i)));
        if breaks {
            out.push_str("\n  ");
        } else if i > 0 {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

fn prev_is_join_qualifier(words: &[&str], i: usize) -> bool {
    i > 0 && JOIN_QUALIFIERS.contains(&words[i - 1].to_ascii_uppercase().as_str())
}

fn leads_to_join(words: &[&str], i: usize) -> bool {
    for word in &words[i + 1..] {
        let upper = word.to_ascii_uppercase();
        if upper == "JOIN" {
            return true;
        }
        if !JOIN_QUALIFIERS.contains(&upper.as_str()) {
            return false;
        }
    }
    false
}

#[cfg(feature = "highlight")]
fn apply_style(text: &str, style: HighlightStyle) -> String {
    if style == HighlightStyle::Plain {
        return text.to_string();
    }
    text.lines()
        .map(|line| {
            line.split(' ')
                .map(|word| {
                    if is_keyword(word) {
                        paint(word, style)
                    } else {
                        word.to_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(not(feature = "highlight"))]
fn apply_style(text: &str, _style: HighlightStyle) -> String {
    text.to_string()
}

#[cfg(feature = "highlight")]
fn paint(word: &str, style: HighlightStyle) -> String {
    use colored::Colorize;

    match style {
        HighlightStyle::Vivid => word.cyan().bold().to_string(),
        HighlightStyle::Muted => word.blue().to_string(),
        HighlightStyle::Plain => word.to_string(),
    }
}

#[cfg(feature = "highlight")]
const KEYWORDS: &[&str] = &[
    "SELECT",
    "INSERT",
    "UPDATE",
    "DELETE",
    "FROM",
    "WHERE",
    "AND",
    "OR",
    "NOT",
    "IN",
    "IS",
    "NULL",
    "AS",
    "ON",
    "JOIN",
    "LEFT",
    "RIGHT",
    "INNER",
    "FULL",
    "OUTER",
    "CROSS",
    "GROUP",
    "ORDER",
    "BY",
    "HAVING",
    "LIMIT",
    "OFFSET",
    "VALUES",
    "SET",
    "INTO",
    "DISTINCT",
    "UNION",
    "ALL",
    "RETURNING",
    "WITH",
    "CASE",
    "WHEN",
    "THEN",
    "ELSE",
    "END",
    "LIKE",
    "BETWEEN",
    "ASC",
    "DESC",
    "EXISTS",
];

#[cfg(feature = "highlight")]
fn is_keyword(word: &str) -> bool {
    let upper = word.to_ascii_uppercase();
    KEYWORDS.contains(&upper.as_str())
}
