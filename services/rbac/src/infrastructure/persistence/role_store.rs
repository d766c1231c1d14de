//! 角色 SQL，所有函数在调用方给定的连接（通常是事务）上执行

use sqlx::PgConnection;
use tessera_adapter_postgres::map_sqlx_error;
use tessera_common::Pagination;
use tessera_errors::{AppError, AppResult};
use tracing::debug;

use super::association::{self, MembershipDiff};
use super::mappers::RoleMapper;
use super::models::{PermissionSummaryRow, RoleModel};
use super::schema::{ROLE_PERMISSION_GROUPS, ROLE_PERMISSIONS, ROLES};
use super::store::{advance_identity, raw_ids, row_exists};
use crate::domain::role::{PermissionId, PermissionSummary, Role, RoleId};

const SELECT_BY_ID: &str = r#"
    SELECT id, name, display_name, description, created_at, updated_at
    FROM roles WHERE id = $1
"#;

const SELECT_ALL: &str = r#"
    SELECT id, name, display_name, description, created_at, updated_at
    FROM roles ORDER BY name
"#;

const SELECT_PAGE: &str = r#"
    SELECT id, name, display_name, description, created_at, updated_at
    FROM roles ORDER BY created_at DESC, id DESC
    LIMIT $1 OFFSET $2
"#;

const INSERT: &str = r#"
    INSERT INTO roles (name, display_name, description, created_at)
    VALUES ($1, $2, $3, $4)
    RETURNING id, name, display_name, description, created_at, updated_at
"#;

const SELECT_FOR_UPDATE: &str = r#"
    SELECT id, name, display_name, description, created_at, updated_at
    FROM roles WHERE id = $1
    FOR UPDATE
"#;

const INSERT_WITH_ID: &str = r#"
    INSERT INTO roles (id, name, display_name, description, created_at)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING id, name, display_name, description, created_at, updated_at
"#;

const UPDATE: &str = r#"
    UPDATE roles SET name = $2, display_name = $3, description = $4, updated_at = NOW()
    WHERE id = $1
    RETURNING id, name, display_name, description, created_at, updated_at
"#;

const SELECT_PERMISSION_SUMMARIES: &str = r#"
    SELECT p.id, p.name, p.display_name, p.category
    FROM permissions p
    JOIN role_permissions rp ON rp.permission_id = p.id
    WHERE rp.role_id = $1
    ORDER BY p.name
"#;

fn persisted_id(model: &RoleModel) -> AppResult<i64> {
    model
        .id
        .ok_or_else(|| AppError::internal("Role row returned without id"))
}

/// 为一行填充两类关联成员后转为实体
async fn hydrate(conn: &mut PgConnection, mut model: RoleModel) -> AppResult<Role> {
    let id = persisted_id(&model)?;
    model.permission_ids = association::members(conn, &ROLE_PERMISSIONS, id).await?;
    model.permission_group_ids = association::members(conn, &ROLE_PERMISSION_GROUPS, id).await?;
    Ok(RoleMapper::to_entity(model))
}

/// 批量填充，每类关联一次查询
async fn hydrate_many(conn: &mut PgConnection, models: Vec<RoleModel>) -> AppResult<Vec<Role>> {
    let ids = models
        .iter()
        .map(persisted_id)
        .collect::<AppResult<Vec<i64>>>()?;
    let mut permissions = association::members_of_many(conn, &ROLE_PERMISSIONS, &ids).await?;
    let mut groups = association::members_of_many(conn, &ROLE_PERMISSION_GROUPS, &ids).await?;

    Ok(models
        .into_iter()
        .zip(ids)
        .map(|(mut model, id)| {
            model.permission_ids = permissions.remove(&id).unwrap_or_default();
            model.permission_group_ids = groups.remove(&id).unwrap_or_default();
            RoleMapper::to_entity(model)
        })
        .collect())
}

pub async fn find(conn: &mut PgConnection, id: RoleId) -> AppResult<Option<Role>> {
    let row = sqlx::query_as::<_, RoleModel>(SELECT_BY_ID)
        .bind(id.0)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    match row {
        Some(model) => Ok(Some(hydrate(conn, model).await?)),
        None => Ok(None),
    }
}

/// 已有行只改标量列并刷新 `updated_at`；不存在时按给定 ID 插入
async fn save_with_id(conn: &mut PgConnection, id: i64, role: &Role) -> AppResult<RoleModel> {
    let existing = sqlx::query_as::<_, RoleModel>(SELECT_FOR_UPDATE)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    match existing {
        Some(mut row) => {
            let row = RoleMapper::update_model_from_entity(&mut row, role);
            sqlx::query_as::<_, RoleModel>(UPDATE)
                .bind(id)
                .bind(&row.name)
                .bind(&row.display_name)
                .bind(&row.description)
                .fetch_one(&mut *conn)
                .await
                .map_err(map_sqlx_error)
        }
        None => {
            let model = RoleMapper::to_model(role);
            let inserted = sqlx::query_as::<_, RoleModel>(INSERT_WITH_ID)
                .bind(id)
                .bind(&model.name)
                .bind(&model.display_name)
                .bind(&model.description)
                .bind(model.created_at)
                .fetch_one(&mut *conn)
                .await
                .map_err(map_sqlx_error)?;
            advance_identity(conn, ROLES, id).await?;
            Ok(inserted)
        }
    }
}

async fn require(conn: &mut PgConnection, id: RoleId) -> AppResult<Role> {
    find(conn, id)
        .await?
        .ok_or_else(|| AppError::entity_not_found("Role", id))
}

pub async fn save(conn: &mut PgConnection, role: &Role) -> AppResult<Role> {
    let model = RoleMapper::to_model(role);

    let saved = match model.id {
        None => sqlx::query_as::<_, RoleModel>(INSERT)
            .bind(&model.name)
            .bind(&model.display_name)
            .bind(&model.description)
            .bind(model.created_at)
            .fetch_one(&mut *conn)
            .await
            .map_err(map_sqlx_error)?,
        Some(id) => save_with_id(conn, id, role).await?,
    };

    let id = persisted_id(&saved)?;
    let permissions: MembershipDiff = association::replace_members(
        conn,
        &ROLE_PERMISSIONS,
        id,
        &raw_ids(&role.permissions),
    )
    .await?;
    let groups = association::replace_members(
        conn,
        &ROLE_PERMISSION_GROUPS,
        id,
        &raw_ids(&role.permission_groups),
    )
    .await?;

    debug!(
        role_id = id,
        permissions_added = permissions.to_insert.len(),
        permissions_removed = permissions.to_delete.len(),
        groups_added = groups.to_insert.len(),
        groups_removed = groups.to_delete.len(),
        "Role saved"
    );

    hydrate(conn, saved).await
}

pub async fn delete(conn: &mut PgConnection, id: RoleId) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM roles WHERE id = $1")
        .bind(id.0)
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    debug!(role_id = id.0, deleted = result.rows_affected(), "Role deleted");
    Ok(())
}

pub async fn list(conn: &mut PgConnection) -> AppResult<Vec<Role>> {
    let rows = sqlx::query_as::<_, RoleModel>(SELECT_ALL)
        .fetch_all(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;
    hydrate_many(conn, rows).await
}

pub async fn list_paginated(
    conn: &mut PgConnection,
    page: u32,
    page_size: u32,
) -> AppResult<(Vec<Role>, u64)> {
    let pagination = Pagination::new(page, page_size);
    let rows = sqlx::query_as::<_, RoleModel>(SELECT_PAGE)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    let total = count(conn).await?;
    Ok((hydrate_many(conn, rows).await?, total))
}

pub async fn count(conn: &mut PgConnection) -> AppResult<u64> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles")
        .fetch_one(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;
    Ok(total as u64)
}

pub async fn add_permissions(
    conn: &mut PgConnection,
    id: RoleId,
    permission_ids: &[PermissionId],
) -> AppResult<Role> {
    if !row_exists(conn, ROLES, id.0).await? {
        return Err(AppError::entity_not_found("Role", id));
    }
    let added =
        association::add_members(conn, &ROLE_PERMISSIONS, id.0, &raw_ids(permission_ids)).await?;
    debug!(role_id = id.0, added, "Permissions added to role");
    require(conn, id).await
}

pub async fn remove_permissions(
    conn: &mut PgConnection,
    id: RoleId,
    permission_ids: &[PermissionId],
) -> AppResult<Role> {
    if !row_exists(conn, ROLES, id.0).await? {
        return Err(AppError::entity_not_found("Role", id));
    }
    let removed =
        association::remove_members(conn, &ROLE_PERMISSIONS, id.0, &raw_ids(permission_ids))
            .await?;
    debug!(role_id = id.0, removed, "Permissions removed from role");
    require(conn, id).await
}

pub async fn count_permissions(conn: &mut PgConnection, id: RoleId) -> AppResult<u64> {
    association::count_members(conn, &ROLE_PERMISSIONS, id.0).await
}

pub async fn find_with_permissions(
    conn: &mut PgConnection,
    id: RoleId,
) -> AppResult<Option<(Role, Vec<PermissionSummary>)>> {
    let Some(role) = find(conn, id).await? else {
        return Ok(None);
    };

    let summaries = sqlx::query_as::<_, PermissionSummaryRow>(SELECT_PERMISSION_SUMMARIES)
        .bind(id.0)
        .fetch_all(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    Ok(Some((role, summaries.into_iter().map(Into::into).collect())))
}
