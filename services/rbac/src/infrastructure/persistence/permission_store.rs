//! 权限 SQL

use indexmap::IndexMap;
use sqlx::PgConnection;
use tessera_adapter_postgres::map_sqlx_error;
use tessera_errors::AppResult;
use tracing::debug;

use super::mappers::PermissionMapper;
use super::models::PermissionModel;
use super::schema::PERMISSIONS;
use super::store::advance_identity;
use crate::domain::role::{Permission, PermissionId};

const SELECT_BY_ID: &str = r#"
    SELECT id, name, display_name, description, category, created_at
    FROM permissions WHERE id = $1
"#;

const SELECT_ALL: &str = r#"
    SELECT id, name, display_name, description, category, created_at
    FROM permissions ORDER BY category, name
"#;

const INSERT: &str = r#"
    INSERT INTO permissions (name, display_name, description, category, created_at)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING id, name, display_name, description, category, created_at
"#;

const SELECT_FOR_UPDATE: &str = r#"
    SELECT id, name, display_name, description, category, created_at
    FROM permissions WHERE id = $1
    FOR UPDATE
"#;

const INSERT_WITH_ID: &str = r#"
    INSERT INTO permissions (id, name, display_name, description, category, created_at)
    VALUES ($1, $2, $3, $4, $5, $6)
    RETURNING id, name, display_name, description, category, created_at
"#;

const UPDATE: &str = r#"
    UPDATE permissions SET name = $2, display_name = $3, description = $4, category = $5
    WHERE id = $1
    RETURNING id, name, display_name, description, category, created_at
"#;

pub async fn find(conn: &mut PgConnection, id: PermissionId) -> AppResult<Option<Permission>> {
    let row = sqlx::query_as::<_, PermissionModel>(SELECT_BY_ID)
        .bind(id.0)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;
    Ok(row.map(PermissionMapper::to_entity))
}

async fn save_with_id(
    conn: &mut PgConnection,
    id: i64,
    permission: &Permission,
) -> AppResult<PermissionModel> {
    let existing = sqlx::query_as::<_, PermissionModel>(SELECT_FOR_UPDATE)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    match existing {
        Some(mut row) => {
            let row = PermissionMapper::update_model_from_entity(&mut row, permission);
            sqlx::query_as::<_, PermissionModel>(UPDATE)
                .bind(id)
                .bind(&row.name)
                .bind(&row.display_name)
                .bind(&row.description)
                .bind(&row.category)
                .fetch_one(&mut *conn)
                .await
                .map_err(map_sqlx_error)
        }
        None => {
            let model = PermissionMapper::to_model(permission);
            let inserted = sqlx::query_as::<_, PermissionModel>(INSERT_WITH_ID)
                .bind(id)
                .bind(&model.name)
                .bind(&model.display_name)
                .bind(&model.description)
                .bind(&model.category)
                .bind(model.created_at)
                .fetch_one(&mut *conn)
                .await
                .map_err(map_sqlx_error)?;
            advance_identity(conn, PERMISSIONS, id).await?;
            Ok(inserted)
        }
    }
}

pub async fn save(conn: &mut PgConnection, permission: &Permission) -> AppResult<Permission> {
    let model = PermissionMapper::to_model(permission);

    let saved = match model.id {
        None => sqlx::query_as::<_, PermissionModel>(INSERT)
            .bind(&model.name)
            .bind(&model.display_name)
            .bind(&model.description)
            .bind(&model.category)
            .bind(model.created_at)
            .fetch_one(&mut *conn)
            .await
            .map_err(map_sqlx_error)?,
        Some(id) => save_with_id(conn, id, permission).await?,
    };

    debug!(permission_id = ?saved.id, name = %saved.name, "Permission saved");
    Ok(PermissionMapper::to_entity(saved))
}

pub async fn delete(conn: &mut PgConnection, id: PermissionId) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM permissions WHERE id = $1")
        .bind(id.0)
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    debug!(permission_id = id.0, deleted = result.rows_affected(), "Permission deleted");
    Ok(())
}

pub async fn list(conn: &mut PgConnection) -> AppResult<Vec<Permission>> {
    let rows = sqlx::query_as::<_, PermissionModel>(SELECT_ALL)
        .fetch_all(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;
    Ok(rows.into_iter().map(PermissionMapper::to_entity).collect())
}

pub async fn count(conn: &mut PgConnection) -> AppResult<u64> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM permissions")
        .fetch_one(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;
    Ok(total as u64)
}

pub async fn group_by_category(
    conn: &mut PgConnection,
) -> AppResult<IndexMap<String, Vec<Permission>>> {
    Ok(partition_by_category(list(conn).await?))
}

/// 按分类分组，保持输入顺序；分类按首次出现排列
pub fn partition_by_category(
    permissions: impl IntoIterator<Item = Permission>,
) -> IndexMap<String, Vec<Permission>> {
    let mut grouped: IndexMap<String, Vec<Permission>> = IndexMap::new();
    for permission in permissions {
        grouped
            .entry(permission.category.clone())
            .or_default()
            .push(permission);
    }
    grouped
}
