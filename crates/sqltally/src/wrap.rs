//! Wrapping a unit of work with statement counting.
//!
//! [`run_counted`] is the core contract: install a fresh interceptor, run
//! the work, report, and hand the work's outcome back unchanged.
//! [`CountingMiddleware`] adapts it to a request-handler pipeline.

use crate::config::ReportConfig;
use crate::interceptor::StatementInterceptor;
use crate::report::{self, RunTarget};
use crate::summary::RunSummary;

/// Run `work` with a fresh [`StatementInterceptor`] and print a report once
/// it returns.
///
/// The interceptor is scoped to this call: it is created on entry, handed to
/// `work`, and closed when `work` returns. The returned value — including an
/// error value — passes through untouched; nothing in the reporting path can
/// alter it.
pub fn run_counted<F, T>(target: RunTarget, config: &ReportConfig, work: F) -> T
where
    F: FnOnce(&StatementInterceptor) -> T,
{
    let interceptor = StatementInterceptor::new();
    let outcome = work(&interceptor);
    let run = interceptor.finish();
    let summary = RunSummary::compute(&run, config);
    report::print(&run, &summary, &target, config);
    outcome
}

/// A request handler that can be wrapped by [`CountingMiddleware`].
pub trait Handler {
    /// The request value.
    type Request;
    /// The response value.
    type Response;

    /// Handle one request, executing statements through `queries`.
    fn handle(&self, request: Self::Request, queries: &StatementInterceptor) -> Self::Response;

    /// Best-effort label for the report's target line. `None` falls back to
    /// the generic label.
    fn describe(&self, _request: &Self::Request) -> Option<RunTarget> {
        None
    }
}

/// Middleware adapter: wraps a handler so every call gets a fresh
/// interceptor and prints a query report.
pub struct CountingMiddleware<H> {
    inner: H,
    config: ReportConfig,
}

impl<H: Handler> CountingMiddleware<H> {
    /// Wrap a handler with the default configuration.
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            config: ReportConfig::default(),
        }
    }

    /// Set the report configuration.
    pub fn with_config(mut self, config: ReportConfig) -> Self {
        self.config = config;
        self
    }

    /// Get a reference to the wrapped handler.
    pub fn inner(&self) -> &H {
        &self.inner
    }

    /// Get the wrapped handler, consuming this adapter.
    pub fn into_inner(self) -> H {
        self.inner
    }

    /// Handle one request and print its query report.
    pub fn call(&self, request: H::Request) -> H::Response {
        let target = self.inner.describe(&request).unwrap_or_default();
        run_counted(target, &self.config, |queries| {
            self.inner.handle(request, queries)
        })
    }
}
