//! 权限命令处理器

use std::sync::Arc;

use tessera_errors::{AppError, AppResult};
use tracing::info;

use super::commands::*;
use crate::domain::role::{Permission, PermissionId, PermissionRepository};

/// 权限命令处理器
pub struct PermissionCommandHandler<R: PermissionRepository + ?Sized> {
    permission_repo: Arc<R>,
}

impl<R: PermissionRepository + ?Sized> PermissionCommandHandler<R> {
    pub fn new(permission_repo: Arc<R>) -> Self {
        Self { permission_repo }
    }

    pub async fn handle_create(&self, request: CreatePermissionRequest) -> AppResult<Permission> {
        let permission = self
            .permission_repo
            .save(&request.into_permission()?)
            .await?;
        info!(permission_id = ?permission.identity, name = %permission.name, "Permission created");
        Ok(permission)
    }

    pub async fn handle_update(
        &self,
        id: PermissionId,
        request: UpdatePermissionRequest,
    ) -> AppResult<Permission> {
        let mut permission = self
            .permission_repo
            .get_by_id(&id)
            .await?
            .ok_or_else(|| AppError::entity_not_found("Permission", id))?;

        request.apply_to(&mut permission)?;
        self.permission_repo.save(&permission).await
    }

    /// 删除权限，角色与权限组中的引用随之移除
    pub async fn handle_delete(&self, id: PermissionId) -> AppResult<()> {
        if self.permission_repo.get_by_id(&id).await?.is_none() {
            return Err(AppError::entity_not_found("Permission", id));
        }
        self.permission_repo.delete(&id).await?;
        info!(permission_id = %id, "Permission deleted");
        Ok(())
    }
}
