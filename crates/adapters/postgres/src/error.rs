//! SQLx 错误到 AppError 的统一转换

use tessera_errors::AppError;

/// 将 SQLx 错误转换为 AppError，区分约束违规、连接池故障与其他数据库错误
pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::RowNotFound => AppError::not_found("Record not found"),
        sqlx::Error::Database(db_err) => {
            let detail = db_err.constraint().map(str::to_string);
            match db_err.code().as_deref() {
                // PostgreSQL 约束违规代码
                Some("23505") => AppError::conflict(match detail {
                    Some(c) => format!("Duplicate entry violates unique constraint {}", c),
                    None => "Duplicate entry violates unique constraint".to_string(),
                }),
                Some("23503") => AppError::validation("Foreign key constraint violation"),
                Some("23514") => AppError::validation("Check constraint violation"),
                Some("23502") => AppError::validation("Not null constraint violation"),
                Some("22001") => AppError::validation("String data too long"),
                Some("22P02") => AppError::validation("Invalid input syntax"),
                Some(code) => AppError::database(format!("Database error ({}): {}", code, db_err)),
                None => AppError::database(db_err.to_string()),
            }
        }
        sqlx::Error::PoolTimedOut => AppError::unavailable("Database connection pool timeout"),
        sqlx::Error::PoolClosed => AppError::unavailable("Database connection pool is closed"),
        sqlx::Error::Io(io) => AppError::unavailable(format!("Database I/O error: {}", io)),
        other => AppError::database(other.to_string()),
    }
}
