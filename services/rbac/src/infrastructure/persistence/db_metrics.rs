//! 数据库调用监控

use std::time::{Duration, Instant};

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;

/// 慢操作阈值
pub const SLOW_QUERY_THRESHOLD: Duration = Duration::from_millis(100);

/// 数据库监控工具
pub struct DbMetrics;

impl DbMetrics {
    /// 记录连接池状态
    pub fn record_pool_state(pool: &PgPool, pool_name: &'static str) {
        gauge!("db_pool_size", "pool" => pool_name).set(f64::from(pool.size()));
        gauge!("db_pool_idle", "pool" => pool_name).set(pool.num_idle() as f64);
    }

    pub fn record_query(elapsed: Duration, table: &'static str, operation: &'static str) {
        histogram!("db_query_duration_ms", "table" => table, "operation" => operation)
            .record(elapsed.as_secs_f64() * 1000.0);
        counter!("db_queries_total", "table" => table, "operation" => operation).increment(1);
    }

    pub fn record_error(table: &'static str, operation: &'static str) {
        counter!("db_query_errors_total", "table" => table, "operation" => operation)
            .increment(1);
    }
}

/// 计时守卫，以 finish / finish_with_error 结束
pub struct QueryTimer {
    start: Instant,
    table: &'static str,
    operation: &'static str,
}

impl QueryTimer {
    pub fn new(table: &'static str, operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            table,
            operation,
        }
    }

    pub fn finish(self) {
        let elapsed = self.start.elapsed();
        DbMetrics::record_query(elapsed, self.table, self.operation);
        self.check_slow(elapsed, false);
    }

    pub fn finish_with_error(self) {
        let elapsed = self.start.elapsed();
        DbMetrics::record_query(elapsed, self.table, self.operation);
        DbMetrics::record_error(self.table, self.operation);
        self.check_slow(elapsed, true);
    }

    fn check_slow(&self, elapsed: Duration, failed: bool) {
        if elapsed <= SLOW_QUERY_THRESHOLD {
            return;
        }
        tracing::warn!(
            table = self.table,
            operation = self.operation,
            duration_ms = elapsed.as_millis() as u64,
            failed,
            "Slow query detected"
        );
        counter!("db_slow_queries_total", "table" => self.table, "operation" => self.operation)
            .increment(1);
    }
}
