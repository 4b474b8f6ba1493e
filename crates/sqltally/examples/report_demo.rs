//! Example demonstrating the query report for a wrapped request handler.
//!
//! Run with:
//!   cargo run --example report_demo -p sqltally
//!
//! No database required: a fake executor simulates statement latency. Try
//! SQLTALLY_PRINT_ALL=1 or SQLTALLY_SLOW_THRESHOLD=0.05 to see the report
//! change shape.

use std::thread;
use std::time::Duration;

use sqltally::{
    CountingMiddleware, Handler, ReportConfig, RunTarget, StatementInterceptor, TallyResult,
};

/// Stand-in for a database client: sleeps for the pretended execution time
/// and returns a row count.
fn fake_execute(latency: Duration, rows: u64) -> Result<u64, String> {
    thread::sleep(latency);
    Ok(rows)
}

/// A handler with the classic N+1 shape: one listing query, then one lookup
/// per row, plus a bulk insert into an audit table.
struct OrderHistory;

impl Handler for OrderHistory {
    type Request = String;
    type Response = Result<u64, String>;

    fn handle(&self, _request: String, queries: &StatementInterceptor) -> Self::Response {
        let orders = queries.capture(
            "SELECT id, user_id FROM orders WHERE created_at > $1",
            1,
            false,
            || fake_execute(Duration::from_millis(30), 4),
        )?;

        for _ in 0..orders {
            queries.capture(
                "SELECT name, email FROM users WHERE id = $1",
                1,
                false,
                || fake_execute(Duration::from_millis(5), 1),
            )?;
        }

        queries.capture(
            "INSERT INTO audit_log (order_id, seen_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            8,
            true,
            || fake_execute(Duration::from_millis(10), 4),
        )?;

        // The offender the slow-query section exists for.
        queries.capture(
            "SELECT count(*) FROM order_items GROUP BY order_id ORDER BY count(*) DESC",
            0,
            false,
            || fake_execute(Duration::from_millis(120), 1),
        )?;

        Ok(orders)
    }

    fn describe(&self, request: &String) -> Option<RunTarget> {
        Some(RunTarget::handler(request.clone(), "orders::history"))
    }
}

fn main() -> TallyResult<()> {
    dotenvy::dotenv().ok();

    let config = ReportConfig::load()?.with_slow_threshold(Duration::from_millis(100));
    let middleware = CountingMiddleware::new(OrderHistory).with_config(config);

    let rows = middleware
        .call("/orders/history".to_string())
        .expect("fake executor never fails");
    println!("handled {rows} orders");
    Ok(())
}
