//! 多对多关联同步
//!
//! 关联表只有 (owner, member) 两列。整体替换时先读取当前成员，
//! 与目标成员求差，再分别执行删除与插入，不依赖 ORM 的集合语义。

use std::collections::{BTreeSet, HashMap};

use sqlx::PgConnection;
use tessera_adapter_postgres::map_sqlx_error;
use tessera_errors::AppResult;

/// 关联表描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Association {
    pub table: &'static str,
    pub owner_column: &'static str,
    pub member_column: &'static str,
    /// 成员实体表，用于过滤不存在的 ID
    pub member_table: &'static str,
}

impl Association {
    fn select_members_sql(&self) -> String {
        format!(
            "SELECT {m} FROM {t} WHERE {o} = $1 ORDER BY {m}",
            t = self.table,
            o = self.owner_column,
            m = self.member_column
        )
    }

    fn select_members_of_many_sql(&self) -> String {
        format!(
            "SELECT {o}, {m} FROM {t} WHERE {o} = ANY($1) ORDER BY {o}, {m}",
            t = self.table,
            o = self.owner_column,
            m = self.member_column
        )
    }

    fn resolve_sql(&self) -> String {
        format!(
            "SELECT id FROM {} WHERE id = ANY($1) ORDER BY id",
            self.member_table
        )
    }

    fn delete_sql(&self) -> String {
        format!(
            "DELETE FROM {t} WHERE {o} = $1 AND {m} = ANY($2)",
            t = self.table,
            o = self.owner_column,
            m = self.member_column
        )
    }

    fn insert_sql(&self) -> String {
        format!(
            "INSERT INTO {t} ({o}, {m}) SELECT $1, UNNEST($2::BIGINT[]) ON CONFLICT DO NOTHING",
            t = self.table,
            o = self.owner_column,
            m = self.member_column
        )
    }

    /// 只插入成员表中存在的 ID
    fn insert_existing_sql(&self) -> String {
        format!(
            "INSERT INTO {t} ({o}, {m}) SELECT $1, e.id FROM {e} e WHERE e.id = ANY($2) \
             ON CONFLICT DO NOTHING",
            t = self.table,
            o = self.owner_column,
            m = self.member_column,
            e = self.member_table
        )
    }

    fn count_sql(&self) -> String {
        format!(
            "SELECT COUNT(*) FROM {} WHERE {} = $1",
            self.table, self.owner_column
        )
    }
}

/// 当前成员与目标成员的差异
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipDiff {
    pub to_insert: Vec<i64>,
    pub to_delete: Vec<i64>,
}

impl MembershipDiff {
    /// 两侧都按集合处理，重复 ID 合并，结果升序
    pub fn compute(current: &[i64], desired: &[i64]) -> Self {
        let current: BTreeSet<i64> = current.iter().copied().collect();
        let desired: BTreeSet<i64> = desired.iter().copied().collect();
        Self {
            to_insert: desired.difference(&current).copied().collect(),
            to_delete: current.difference(&desired).copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_insert.is_empty() && self.to_delete.is_empty()
    }
}

/// 某个 owner 的成员 ID，升序
pub async fn members(
    conn: &mut PgConnection,
    assoc: &Association,
    owner_id: i64,
) -> AppResult<Vec<i64>> {
    sqlx::query_scalar::<_, i64>(&assoc.select_members_sql())
        .bind(owner_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(map_sqlx_error)
}

/// 一次查询取多个 owner 的成员；没有成员的 owner 不出现在结果中
pub async fn members_of_many(
    conn: &mut PgConnection,
    assoc: &Association,
    owner_ids: &[i64],
) -> AppResult<HashMap<i64, Vec<i64>>> {
    if owner_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(i64, i64)> = sqlx::query_as(&assoc.select_members_of_many_sql())
        .bind(owner_ids)
        .fetch_all(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    let mut grouped: HashMap<i64, Vec<i64>> = HashMap::new();
    for (owner, member) in rows {
        grouped.entry(owner).or_default().push(member);
    }
    Ok(grouped)
}

/// 过滤掉成员表中不存在的 ID
async fn resolve_existing(
    conn: &mut PgConnection,
    assoc: &Association,
    ids: &[i64],
) -> AppResult<Vec<i64>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_scalar::<_, i64>(&assoc.resolve_sql())
        .bind(ids)
        .fetch_all(&mut *conn)
        .await
        .map_err(map_sqlx_error)
}

/// 整体替换成员：不存在的 ID 被忽略，空列表清空关联
pub async fn replace_members(
    conn: &mut PgConnection,
    assoc: &Association,
    owner_id: i64,
    desired: &[i64],
) -> AppResult<MembershipDiff> {
    let current = members(conn, assoc, owner_id).await?;
    let desired = resolve_existing(conn, assoc, desired).await?;
    let diff = MembershipDiff::compute(&current, &desired);
    if diff.is_empty() {
        return Ok(diff);
    }

    if !diff.to_delete.is_empty() {
        sqlx::query(&assoc.delete_sql())
            .bind(owner_id)
            .bind(&diff.to_delete)
            .execute(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;
    }

    if !diff.to_insert.is_empty() {
        sqlx::query(&assoc.insert_sql())
            .bind(owner_id)
            .bind(&diff.to_insert)
            .execute(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;
    }

    Ok(diff)
}

/// 追加成员，返回实际新增的行数
pub async fn add_members(
    conn: &mut PgConnection,
    assoc: &Association,
    owner_id: i64,
    ids: &[i64],
) -> AppResult<u64> {
    if ids.is_empty() {
        return Ok(0);
    }
    let result = sqlx::query(&assoc.insert_existing_sql())
        .bind(owner_id)
        .bind(ids)
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;
    Ok(result.rows_affected())
}

/// 移除成员，返回实际删除的行数
pub async fn remove_members(
    conn: &mut PgConnection,
    assoc: &Association,
    owner_id: i64,
    ids: &[i64],
) -> AppResult<u64> {
    if ids.is_empty() {
        return Ok(0);
    }
    let result = sqlx::query(&assoc.delete_sql())
        .bind(owner_id)
        .bind(ids)
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;
    Ok(result.rows_affected())
}

pub async fn count_members(
    conn: &mut PgConnection,
    assoc: &Association,
    owner_id: i64,
) -> AppResult<u64> {
    let count: i64 = sqlx::query_scalar(&assoc.count_sql())
        .bind(owner_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;
    Ok(count as u64)
}
