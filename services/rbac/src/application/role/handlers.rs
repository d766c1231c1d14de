//! 角色命令处理器

use std::sync::Arc;

use tessera_errors::{AppError, AppResult};
use tracing::info;

use super::commands::*;
use crate::domain::role::{PermissionId, Role, RoleId, RoleRepository};

/// 角色命令处理器
pub struct RoleCommandHandler<R: RoleRepository + ?Sized> {
    role_repo: Arc<R>,
}

impl<R: RoleRepository + ?Sized> RoleCommandHandler<R> {
    pub fn new(role_repo: Arc<R>) -> Self {
        Self { role_repo }
    }

    /// 创建角色
    pub async fn handle_create(&self, request: CreateRoleRequest) -> AppResult<Role> {
        request.validate()?;
        let role = self.role_repo.save(&request.into_role()).await?;
        info!(role_id = ?role.identity, name = %role.name, "Role created");
        Ok(role)
    }

    /// 更新角色
    pub async fn handle_update(&self, id: RoleId, request: UpdateRoleRequest) -> AppResult<Role> {
        request.validate()?;
        let mut role = self
            .role_repo
            .get_by_id(&id)
            .await?
            .ok_or_else(|| AppError::entity_not_found("Role", id))?;

        request.apply_to(&mut role);
        self.role_repo.save(&role).await
    }

    /// 删除角色
    pub async fn handle_delete(&self, id: RoleId) -> AppResult<()> {
        if self.role_repo.get_by_id(&id).await?.is_none() {
            return Err(AppError::entity_not_found("Role", id));
        }
        self.role_repo.delete(&id).await?;
        info!(role_id = %id, "Role deleted");
        Ok(())
    }

    pub async fn handle_add_permissions(
        &self,
        id: RoleId,
        permission_ids: &[PermissionId],
    ) -> AppResult<Role> {
        self.role_repo.add_permissions(&id, permission_ids).await
    }

    pub async fn handle_remove_permissions(
        &self,
        id: RoleId,
        permission_ids: &[PermissionId],
    ) -> AppResult<Role> {
        self.role_repo.remove_permissions(&id, permission_ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::role::{Permission, PermissionRepository};
    use crate::testing::{InMemoryDb, InMemoryPermissionRepository, InMemoryRoleRepository};
    use tessera_domain_core::Entity;

    fn setup() -> (RoleCommandHandler<InMemoryRoleRepository>, InMemoryPermissionRepository) {
        let db = InMemoryDb::new();
        (
            RoleCommandHandler::new(Arc::new(InMemoryRoleRepository::new(db.clone()))),
            InMemoryPermissionRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_handle_create() {
        let (handler, permissions) = setup();
        let read = permissions
            .save(&Permission::new("users.read", "Read users").unwrap())
            .await
            .unwrap();

        let mut request = CreateRoleRequest::new("support", "Support");
        request.permissions = vec![read.id().unwrap(), PermissionId(999)];
        let role = handler.handle_create(request).await.unwrap();

        assert!(role.is_persisted());
        // 不存在的权限被丢弃
        assert_eq!(role.permissions, vec![read.id().unwrap()]);
    }

    #[tokio::test]
    async fn test_handle_create_rejects_invalid_request() {
        let (handler, _) = setup();
        let err = handler
            .handle_create(CreateRoleRequest::new("", "Nameless"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_handle_update_missing_role() {
        let (handler, _) = setup();
        let err = handler
            .handle_update(RoleId(42), UpdateRoleRequest::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_handle_update_keeps_other_fields() {
        let (handler, _) = setup();
        let role = handler
            .handle_create(CreateRoleRequest::new("support", "Support"))
            .await
            .unwrap();
        let id = role.id().unwrap();

        let updated = handler
            .handle_update(
                id,
                UpdateRoleRequest {
                    description: Some("Front line".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "support");
        assert_eq!(updated.description.as_deref(), Some("Front line"));
        assert_eq!(updated.created_at, role.created_at);
        assert!(updated.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_handle_delete() {
        let (handler, _) = setup();
        let role = handler
            .handle_create(CreateRoleRequest::new("temp", "Temp"))
            .await
            .unwrap();
        let id = role.id().unwrap();

        handler.handle_delete(id).await.unwrap();
        assert!(handler.handle_delete(id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_add_then_remove_permissions() {
        let (handler, permissions) = setup();
        let p1 = permissions
            .save(&Permission::new("tickets.read", "Read").unwrap())
            .await
            .unwrap()
            .id()
            .unwrap();
        let p2 = permissions
            .save(&Permission::new("tickets.write", "Write").unwrap())
            .await
            .unwrap()
            .id()
            .unwrap();
        let role = handler
            .handle_create(CreateRoleRequest::new("agent", "Agent"))
            .await
            .unwrap();
        let id = role.id().unwrap();

        let added = handler.handle_add_permissions(id, &[p1, p2, p1]).await.unwrap();
        assert_eq!(added.permissions, vec![p1, p2]);

        let again = handler.handle_add_permissions(id, &[p1]).await.unwrap();
        assert_eq!(again.permissions, vec![p1, p2]);

        let removed = handler.handle_remove_permissions(id, &[p2]).await.unwrap();
        assert_eq!(removed.permissions, vec![p1]);
    }

    #[tokio::test]
    async fn test_add_permissions_to_missing_role() {
        let (handler, _) = setup();
        let err = handler
            .handle_add_permissions(RoleId(5), &[PermissionId(1)])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
