//! The statement interceptor: capture-around-execute with timing.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::types::{StatementRecord, normalize_placeholders};

/// A closed capture: the record sequence plus the span's wall-clock time.
///
/// Produced by [`StatementInterceptor::finish`] and consumed by
/// [`RunSummary::compute`](crate::summary::RunSummary::compute); discarded
/// once the report prints.
#[derive(Debug, Clone)]
pub struct CapturedRun {
    /// Records in execution order.
    pub records: Vec<StatementRecord>,
    /// Wall-clock time from interceptor creation to `finish`.
    pub elapsed: Duration,
}

/// Collects one [`StatementRecord`] per statement executed within a wrapped
/// span of work.
///
/// An interceptor is scoped to exactly one wrapped call: create it on entry,
/// route every statement execution through [`capture`](Self::capture), and
/// close it with [`finish`](Self::finish) on exit. Nesting wrapped calls
/// takes independent instances, each capturing only the statements executed
/// through it.
///
/// The record sequence sits behind a `Mutex` only so `capture` can take
/// `&self`; the intended use is single-threaded.
pub struct StatementInterceptor {
    records: Mutex<Vec<StatementRecord>>,
    started: Instant,
}

impl StatementInterceptor {
    /// Create a fresh interceptor and start the elapsed clock.
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            started: Instant::now(),
        }
    }

    /// Execute `execute` exactly once, measuring its wall-clock duration, and
    /// append a record built from the inputs and measured duration.
    ///
    /// The record is appended whether the closure succeeded or failed, and
    /// the closure's result is returned unchanged; no error is introduced or
    /// suppressed here.
    pub fn capture<T, E>(
        &self,
        sql: &str,
        param_count: usize,
        many: bool,
        execute: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        self.capture_tagged(None, sql, param_count, many, execute)
    }

    /// Like [`capture`](Self::capture), with a caller tag carried into the
    /// per-statement tracing event.
    pub fn capture_tagged<T, E>(
        &self,
        tag: Option<&str>,
        sql: &str,
        param_count: usize,
        many: bool,
        execute: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        let start = Instant::now();
        let result = execute();
        let duration = start.elapsed();

        let record = StatementRecord {
            sql: normalize_placeholders(sql),
            param_count,
            many,
            duration,
        };

        #[cfg(feature = "tracing")]
        emit_statement(tag, &record, result.is_err());
        #[cfg(not(feature = "tracing"))]
        let _ = tag;

        self.records.lock().unwrap().push(record);
        result
    }

    /// Number of statements captured so far.
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Whether no statements have been captured yet.
    pub fn is_empty(&self) -> bool {
        self.records.lock().unwrap().is_empty()
    }

    /// Close the sequence and fix the elapsed time.
    pub fn finish(&self) -> CapturedRun {
        CapturedRun {
            records: self.records.lock().unwrap().clone(),
            elapsed: self.started.elapsed(),
        }
    }
}

impl Default for StatementInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "tracing")]
fn emit_statement(tag: Option<&str>, record: &StatementRecord, failed: bool) {
    use crate::types::{StatementKind, truncate_sql_bytes};

    let sql = truncate_sql_bytes(&record.sql, 200);
    tracing::debug!(
        target: "sqltally.sql",
        kind = ?StatementKind::from_sql(&record.sql),
        tag = tag.unwrap_or("-"),
        param_count = record.param_count,
        many = record.many,
        duration_ms = record.duration.as_millis() as u64,
        failed,
        sql = %sql,
    );
}
