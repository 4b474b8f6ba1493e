//! # sqltally
//!
//! Per-call SQL statement counting with duplicate and slow-query reporting.
//!
//! Wrap a unit of work (a request handler or any callable), route every
//! database statement through the interceptor it hands you, and get a
//! colorized terminal report when the wrapped call returns: per-kind counts,
//! duplicate groups, the slowest queries, and total elapsed time.
//!
//! ## Features
//!
//! - **Transparent wrapping**: the wrapped call's result (or error value)
//!   passes through unchanged; nothing in the reporting path can alter it
//! - **Duplicate detection**: identical statements group together, with bulk
//!   placeholder lists normalized so batch size never splits a group
//! - **Slow-query ranking**: the top N statements over a configurable
//!   threshold, slowest first
//! - **Severity coloring**: the summary table is colored by a configurable
//!   count → color tier table
//! - **Driver-agnostic**: the interceptor wraps any execution closure; no
//!   database dependency
//!
//! ## Usage
//!
//! ```ignore
//! use sqltally::{run_counted, ReportConfig, RunTarget};
//!
//! let users = run_counted(
//!     RunTarget::callable("api::list_users"),
//!     &ReportConfig::load()?,
//!     |queries| {
//!         queries.capture("SELECT * FROM users", 0, false, || {
//!             client.query("SELECT * FROM users", &[])
//!         })
//!     },
//! )?;
//! ```
//!
//! For a request pipeline, implement [`Handler`] and wrap it in
//! [`CountingMiddleware`]; every `call` then prints its own report, labeled
//! with the request path and handler name.

pub mod config;
pub mod error;
pub mod highlight;
pub mod interceptor;
pub mod report;
pub mod summary;
pub mod types;
pub mod wrap;

pub use config::{HighlightStyle, ReportConfig, SeverityMetric, TablePreset};
pub use error::{TallyError, TallyResult};
pub use highlight::{highlight_available, prettify};
pub use interceptor::{CapturedRun, StatementInterceptor};
pub use report::{RunTarget, print, render};
pub use summary::{DuplicateGroup, KindCounts, RunSummary, SlowStatement};
pub use types::{StatementKind, StatementRecord};
pub use wrap::{CountingMiddleware, Handler, run_counted};
