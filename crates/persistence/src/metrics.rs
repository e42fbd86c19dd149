//! Storage metrics: per-query latency and pool occupancy.

use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Latency of a single repository query, labelled by query name and outcome.
pub fn record_query_duration(query: &'static str, outcome: &'static str, seconds: f64) {
    histogram!(
        "database_query_duration_seconds",
        "query" => query,
        "outcome" => outcome
    )
    .record(seconds);
}

/// Publishes the pool's current size split into busy and idle connections.
pub fn record_pool_metrics(pool: &PgPool) {
    let total = pool.size() as usize;
    let idle = pool.num_idle();

    gauge!("database_connections_active").set(total.saturating_sub(idle) as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(total as f64);
}

/// Stopwatch around one repository query.
///
/// `finish` passes the query result through untouched, so a repository
/// method can end with `timer.finish(result)`.
pub struct QueryTimer {
    query: &'static str,
    started: Instant,
}

impl QueryTimer {
    pub fn new(query: &'static str) -> Self {
        Self {
            query,
            started: Instant::now(),
        }
    }

    pub fn finish<T, E>(self, result: Result<T, E>) -> Result<T, E> {
        let outcome = if result.is_ok() { "ok" } else { "error" };
        record_query_duration(self.query, outcome, self.started.elapsed().as_secs_f64());
        result
    }
}
