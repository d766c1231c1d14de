//! 权限组查询处理器

use std::sync::Arc;

use tessera_errors::{AppError, AppResult};

use crate::domain::role::{PermissionGroup, PermissionGroupId, PermissionGroupRepository};

pub struct PermissionGroupQueryHandler<R: PermissionGroupRepository + ?Sized> {
    group_repo: Arc<R>,
}

impl<R: PermissionGroupRepository + ?Sized> PermissionGroupQueryHandler<R> {
    pub fn new(group_repo: Arc<R>) -> Self {
        Self { group_repo }
    }

    pub async fn handle_get(&self, id: PermissionGroupId) -> AppResult<PermissionGroup> {
        self.group_repo
            .get_by_id(&id)
            .await?
            .ok_or_else(|| AppError::entity_not_found("PermissionGroup", id))
    }

    /// 按 (order, name) 排序
    pub async fn handle_list(&self) -> AppResult<Vec<PermissionGroup>> {
        self.group_repo.list().await
    }

    pub async fn handle_count(&self) -> AppResult<u64> {
        self.group_repo.count().await
    }

    pub async fn handle_count_permissions(&self, id: PermissionGroupId) -> AppResult<u64> {
        self.group_repo.count_permissions(&id).await
    }
}
