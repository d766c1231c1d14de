//! PostgreSQL 连接管理

use sqlx::postgres::PgPool;
use tessera_common::{is_retryable_error, with_conditional_retry};
use tessera_errors::AppResult;
use tracing::info;

use crate::{PostgresConfig, map_sqlx_error};

/// 创建 PostgreSQL 连接池，瞬时故障按指数退避重试
pub async fn create_pool(config: &PostgresConfig) -> AppResult<PgPool> {
    let connect_options = config.connect_options().map_err(map_sqlx_error)?;
    let retry = config.retry_config();

    let pool = with_conditional_retry(
        &retry,
        "postgres_connect",
        || {
            config
                .pool_options()
                .connect_with(connect_options.clone())
        },
        |e: &sqlx::Error| is_transient(e),
    )
    .await
    .map_err(map_sqlx_error)?;

    info!(
        max_connections = config.pool_max,
        min_connections = config.pool_min,
        "PostgreSQL pool created"
    );
    Ok(pool)
}

fn is_transient(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut => true,
        // 认证失败、库不存在等不重试
        sqlx::Error::Database(_) | sqlx::Error::Configuration(_) => false,
        other => is_retryable_error(&other.to_string()),
    }
}

/// 检查数据库连接
pub async fn check_connection(pool: &PgPool) -> AppResult<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(map_sqlx_error)?;
    Ok(())
}
