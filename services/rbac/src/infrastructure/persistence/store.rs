//! 各实体 SQL 共用的小工具

use sqlx::PgConnection;
use tessera_adapter_postgres::map_sqlx_error;
use tessera_errors::AppResult;

pub async fn row_exists(conn: &mut PgConnection, table: &str, id: i64) -> AppResult<bool> {
    sqlx::query_scalar::<_, bool>(&format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)",
        table
    ))
    .bind(id)
    .fetch_one(&mut *conn)
    .await
    .map_err(map_sqlx_error)
}

/// 显式指定 ID 插入后，保证 identity 序列不小于该 ID；序列只前进不后退
///
/// 序列当前值可能属于已删除的行或其他事务尚未提交的行，不能用 `MAX(id)` 覆盖。
/// 同一张表上的推进操作由事务级 advisory lock 串行化。
pub async fn advance_identity(conn: &mut PgConnection, table: &str, id: i64) -> AppResult<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(format!("identity:{}", table))
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    sqlx::query(ADVANCE_SEQUENCE)
        .bind(id)
        .bind(table)
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;
    Ok(())
}

// 从未调用过 nextval 时 pg_sequence_last_value 为 NULL
const ADVANCE_SEQUENCE: &str = r#"
    SELECT setval(s.seq, GREATEST($1, COALESCE(pg_sequence_last_value(s.seq), 0)))
    FROM (SELECT pg_get_serial_sequence($2, 'id')::regclass AS seq) s
"#;

pub fn raw_ids<I: Copy + Into<i64>>(ids: &[I]) -> Vec<i64> {
    ids.iter().map(|&id| id.into()).collect()
}
