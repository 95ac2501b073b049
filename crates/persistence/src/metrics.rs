//! Database metrics collection.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Record database query duration.
pub fn record_query_duration(query_name: &str, duration_secs: f64) {
    histogram!(
        "database_query_duration_seconds",
        "query" => query_name.to_string()
    )
    .record(duration_secs);
}

/// Count a failed query.
pub fn record_query_error(query_name: &str) {
    counter!(
        "database_query_errors_total",
        "query" => query_name.to_string()
    )
    .increment(1);
}

/// Record database connection pool metrics.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();
    let active = size.saturating_sub(idle);

    gauge!("database_connections_active").set(active as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}

/// Times one query and records it on completion.
///
/// ```ignore
/// let timer = QueryTimer::new("find_template_by_id");
/// let result = sqlx::query_as::<_, TemplateEntity>(...).fetch_optional(&pool).await;
/// timer.finish(&result);
/// ```
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    /// Records the elapsed duration, and an error count if `result` failed.
    pub fn finish<T, E>(self, result: &Result<T, E>) {
        record_query_duration(self.query_name, self.start.elapsed().as_secs_f64());
        if result.is_err() {
            record_query_error(self.query_name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_timer_keeps_name() {
        let timer = QueryTimer::new("count_templates");
        assert_eq!(timer.query_name, "count_templates");
    }

    #[test]
    fn test_finish_without_recorder_is_noop() {
        let ok: Result<(), ()> = Ok(());
        QueryTimer::new("ok_query").finish(&ok);
        QueryTimer::new("failed_query").finish(&Err::<(), _>(()));
    }
}
