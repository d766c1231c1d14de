//! 权限组命令处理器

use std::sync::Arc;

use tessera_errors::{AppError, AppResult};
use tracing::info;

use super::commands::*;
use crate::domain::role::{
    PermissionGroup, PermissionGroupId, PermissionGroupRepository, PermissionId,
};

pub struct PermissionGroupCommandHandler<R: PermissionGroupRepository + ?Sized> {
    group_repo: Arc<R>,
}

impl<R: PermissionGroupRepository + ?Sized> PermissionGroupCommandHandler<R> {
    pub fn new(group_repo: Arc<R>) -> Self {
        Self { group_repo }
    }

    pub async fn handle_create(
        &self,
        request: CreatePermissionGroupRequest,
    ) -> AppResult<PermissionGroup> {
        request.validate()?;
        let group = self.group_repo.save(&request.into_group()).await?;
        info!(
            permission_group_id = ?group.identity,
            name = %group.name,
            "Permission group created"
        );
        Ok(group)
    }

    pub async fn handle_update(
        &self,
        id: PermissionGroupId,
        request: UpdatePermissionGroupRequest,
    ) -> AppResult<PermissionGroup> {
        let mut group = self
            .group_repo
            .get_by_id(&id)
            .await?
            .ok_or_else(|| AppError::entity_not_found("PermissionGroup", id))?;

        request.apply_to(&mut group);
        self.group_repo.save(&group).await
    }

    pub async fn handle_delete(&self, id: PermissionGroupId) -> AppResult<()> {
        if self.group_repo.get_by_id(&id).await?.is_none() {
            return Err(AppError::entity_not_found("PermissionGroup", id));
        }
        self.group_repo.delete(&id).await?;
        info!(permission_group_id = %id, "Permission group deleted");
        Ok(())
    }

    pub async fn handle_add_permissions(
        &self,
        id: PermissionGroupId,
        permission_ids: &[PermissionId],
    ) -> AppResult<PermissionGroup> {
        self.group_repo.add_permissions(&id, permission_ids).await
    }

    pub async fn handle_remove_permissions(
        &self,
        id: PermissionGroupId,
        permission_ids: &[PermissionId],
    ) -> AppResult<PermissionGroup> {
        self.group_repo.remove_permissions(&id, permission_ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::role::{Permission, PermissionRepository};
    use crate::testing::{
        InMemoryDb, InMemoryPermissionGroupRepository, InMemoryPermissionRepository,
    };
    use tessera_domain_core::Entity;

    #[tokio::test]
    async fn test_group_membership_lifecycle() {
        let db = InMemoryDb::new();
        let permissions = InMemoryPermissionRepository::new(db.clone());
        let groups = Arc::new(InMemoryPermissionGroupRepository::new(db));
        let handler = PermissionGroupCommandHandler::new(groups);

        let read = permissions
            .save(&Permission::new("users.read", "Read").unwrap())
            .await
            .unwrap()
            .id()
            .unwrap();

        let group = handler
            .handle_create(CreatePermissionGroupRequest::new("users_management", "Users"))
            .await
            .unwrap();
        let id = group.id().unwrap();
        assert!(!group.has_permissions());

        let group = handler.handle_add_permissions(id, &[read]).await.unwrap();
        assert_eq!(group.permissions, vec![read]);

        let group = handler
            .handle_update(
                id,
                UpdatePermissionGroupRequest {
                    permissions: Some(Vec::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(group.permissions.is_empty());

        handler.handle_delete(id).await.unwrap();
        let err = handler
            .handle_remove_permissions(id, &[read])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
