//! 权限组 SQL

use sqlx::PgConnection;
use tessera_adapter_postgres::map_sqlx_error;
use tessera_errors::{AppError, AppResult};
use tracing::debug;

use super::association;
use super::mappers::PermissionGroupMapper;
use super::models::PermissionGroupModel;
use super::schema::{PERMISSION_GROUP_PERMISSIONS, PERMISSION_GROUPS};
use super::store::{advance_identity, raw_ids, row_exists};
use crate::domain::role::{PermissionGroup, PermissionGroupId, PermissionId};

const SELECT_BY_ID: &str = r#"
    SELECT id, name, display_name, description, icon, "order", created_at
    FROM permission_groups WHERE id = $1
"#;

const SELECT_ALL: &str = r#"
    SELECT id, name, display_name, description, icon, "order", created_at
    FROM permission_groups ORDER BY "order", name
"#;

const INSERT: &str = r#"
    INSERT INTO permission_groups (name, display_name, description, icon, "order", created_at)
    VALUES ($1, $2, $3, $4, $5, $6)
    RETURNING id, name, display_name, description, icon, "order", created_at
"#;

const SELECT_FOR_UPDATE: &str = r#"
    SELECT id, name, display_name, description, icon, "order", created_at
    FROM permission_groups WHERE id = $1
    FOR UPDATE
"#;

const INSERT_WITH_ID: &str = r#"
    INSERT INTO permission_groups (id, name, display_name, description, icon, "order", created_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
    RETURNING id, name, display_name, description, icon, "order", created_at
"#;

const UPDATE: &str = r#"
    UPDATE permission_groups
    SET name = $2, display_name = $3, description = $4, icon = $5, "order" = $6
    WHERE id = $1
    RETURNING id, name, display_name, description, icon, "order", created_at
"#;

fn persisted_id(model: &PermissionGroupModel) -> AppResult<i64> {
    model
        .id
        .ok_or_else(|| AppError::internal("Permission group row returned without id"))
}

async fn hydrate(
    conn: &mut PgConnection,
    mut model: PermissionGroupModel,
) -> AppResult<PermissionGroup> {
    let id = persisted_id(&model)?;
    model.permission_ids = association::members(conn, &PERMISSION_GROUP_PERMISSIONS, id).await?;
    Ok(PermissionGroupMapper::to_entity(model))
}

pub async fn find(
    conn: &mut PgConnection,
    id: PermissionGroupId,
) -> AppResult<Option<PermissionGroup>> {
    let row = sqlx::query_as::<_, PermissionGroupModel>(SELECT_BY_ID)
        .bind(id.0)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    match row {
        Some(model) => Ok(Some(hydrate(conn, model).await?)),
        None => Ok(None),
    }
}

async fn require(conn: &mut PgConnection, id: PermissionGroupId) -> AppResult<PermissionGroup> {
    find(conn, id)
        .await?
        .ok_or_else(|| AppError::entity_not_found("PermissionGroup", id))
}

async fn save_with_id(
    conn: &mut PgConnection,
    id: i64,
    group: &PermissionGroup,
) -> AppResult<PermissionGroupModel> {
    let existing = sqlx::query_as::<_, PermissionGroupModel>(SELECT_FOR_UPDATE)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    match existing {
        Some(mut row) => {
            let row = PermissionGroupMapper::update_model_from_entity(&mut row, group);
            sqlx::query_as::<_, PermissionGroupModel>(UPDATE)
                .bind(id)
                .bind(&row.name)
                .bind(&row.display_name)
                .bind(&row.description)
                .bind(&row.icon)
                .bind(row.order)
                .fetch_one(&mut *conn)
                .await
                .map_err(map_sqlx_error)
        }
        None => {
            let model = PermissionGroupMapper::to_model(group);
            let inserted = sqlx::query_as::<_, PermissionGroupModel>(INSERT_WITH_ID)
                .bind(id)
                .bind(&model.name)
                .bind(&model.display_name)
                .bind(&model.description)
                .bind(&model.icon)
                .bind(model.order)
                .bind(model.created_at)
                .fetch_one(&mut *conn)
                .await
                .map_err(map_sqlx_error)?;
            advance_identity(conn, PERMISSION_GROUPS, id).await?;
            Ok(inserted)
        }
    }
}

pub async fn save(conn: &mut PgConnection, group: &PermissionGroup) -> AppResult<PermissionGroup> {
    let model = PermissionGroupMapper::to_model(group);

    let saved = match model.id {
        None => sqlx::query_as::<_, PermissionGroupModel>(INSERT)
            .bind(&model.name)
            .bind(&model.display_name)
            .bind(&model.description)
            .bind(&model.icon)
            .bind(model.order)
            .bind(model.created_at)
            .fetch_one(&mut *conn)
            .await
            .map_err(map_sqlx_error)?,
        Some(id) => save_with_id(conn, id, group).await?,
    };

    let id = persisted_id(&saved)?;
    let diff = association::replace_members(
        conn,
        &PERMISSION_GROUP_PERMISSIONS,
        id,
        &raw_ids(&group.permissions),
    )
    .await?;

    debug!(
        permission_group_id = id,
        added = diff.to_insert.len(),
        removed = diff.to_delete.len(),
        "Permission group saved"
    );

    hydrate(conn, saved).await
}

pub async fn delete(conn: &mut PgConnection, id: PermissionGroupId) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM permission_groups WHERE id = $1")
        .bind(id.0)
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    debug!(
        permission_group_id = id.0,
        deleted = result.rows_affected(),
        "Permission group deleted"
    );
    Ok(())
}

pub async fn list(conn: &mut PgConnection) -> AppResult<Vec<PermissionGroup>> {
    let rows = sqlx::query_as::<_, PermissionGroupModel>(SELECT_ALL)
        .fetch_all(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    let ids = rows
        .iter()
        .map(persisted_id)
        .collect::<AppResult<Vec<i64>>>()?;
    let mut members =
        association::members_of_many(conn, &PERMISSION_GROUP_PERMISSIONS, &ids).await?;

    Ok(rows
        .into_iter()
        .zip(ids)
        .map(|(mut model, id)| {
            model.permission_ids = members.remove(&id).unwrap_or_default();
            PermissionGroupMapper::to_entity(model)
        })
        .collect())
}

pub async fn count(conn: &mut PgConnection) -> AppResult<u64> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM permission_groups")
        .fetch_one(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;
    Ok(total as u64)
}

pub async fn add_permissions(
    conn: &mut PgConnection,
    id: PermissionGroupId,
    permission_ids: &[PermissionId],
) -> AppResult<PermissionGroup> {
    if !row_exists(conn, PERMISSION_GROUPS, id.0).await? {
        return Err(AppError::entity_not_found("PermissionGroup", id));
    }
    let added = association::add_members(
        conn,
        &PERMISSION_GROUP_PERMISSIONS,
        id.0,
        &raw_ids(permission_ids),
    )
    .await?;
    debug!(permission_group_id = id.0, added, "Permissions added to group");
    require(conn, id).await
}

pub async fn remove_permissions(
    conn: &mut PgConnection,
    id: PermissionGroupId,
    permission_ids: &[PermissionId],
) -> AppResult<PermissionGroup> {
    if !row_exists(conn, PERMISSION_GROUPS, id.0).await? {
        return Err(AppError::entity_not_found("PermissionGroup", id));
    }
    let removed = association::remove_members(
        conn,
        &PERMISSION_GROUP_PERMISSIONS,
        id.0,
        &raw_ids(permission_ids),
    )
    .await?;
    debug!(permission_group_id = id.0, removed, "Permissions removed from group");
    require(conn, id).await
}

pub async fn count_permissions(conn: &mut PgConnection, id: PermissionGroupId) -> AppResult<u64> {
    association::count_members(conn, &PERMISSION_GROUP_PERMISSIONS, id.0).await
}
