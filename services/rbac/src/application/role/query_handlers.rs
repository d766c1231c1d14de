//! 角色查询处理器

use std::sync::Arc;

use tessera_common::PagedResult;
use tessera_errors::{AppError, AppResult};

use crate::application::dto::PaginationRequest;
use crate::domain::role::{PermissionSummary, Role, RoleId, RoleRepository};

/// 角色查询处理器
pub struct RoleQueryHandler<R: RoleRepository + ?Sized> {
    role_repo: Arc<R>,
}

impl<R: RoleRepository + ?Sized> RoleQueryHandler<R> {
    pub fn new(role_repo: Arc<R>) -> Self {
        Self { role_repo }
    }

    /// 获取角色详情
    pub async fn handle_get(&self, id: RoleId) -> AppResult<Role> {
        self.role_repo
            .get_by_id(&id)
            .await?
            .ok_or_else(|| AppError::entity_not_found("Role", id))
    }

    /// 角色及其权限详情
    pub async fn handle_get_expanded(
        &self,
        id: RoleId,
    ) -> AppResult<(Role, Vec<PermissionSummary>)> {
        self.role_repo
            .get_by_id_with_permissions(&id)
            .await?
            .ok_or_else(|| AppError::entity_not_found("Role", id))
    }

    pub async fn handle_list(&self) -> AppResult<Vec<Role>> {
        self.role_repo.list().await
    }

    /// 分页列出角色，最新创建的在前
    pub async fn handle_list_paginated(
        &self,
        request: PaginationRequest,
    ) -> AppResult<PagedResult<Role>> {
        request.validate()?;
        let (roles, total) = self
            .role_repo
            .list_paginated(request.page, request.page_size)
            .await?;
        Ok(PagedResult::new(roles, total, &request.to_pagination()))
    }

    pub async fn handle_count(&self) -> AppResult<u64> {
        self.role_repo.count().await
    }

    pub async fn handle_count_permissions(&self, id: RoleId) -> AppResult<u64> {
        self.role_repo.count_permissions(&id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::role::{Permission, PermissionRepository};
    use crate::testing::{InMemoryDb, InMemoryPermissionRepository, InMemoryRoleRepository};
    use chrono::{Duration, Utc};
    use tessera_domain_core::Entity;

    fn setup() -> (
        RoleQueryHandler<InMemoryRoleRepository>,
        Arc<InMemoryRoleRepository>,
        InMemoryPermissionRepository,
    ) {
        let db = InMemoryDb::new();
        let roles = Arc::new(InMemoryRoleRepository::new(db.clone()));
        (
            RoleQueryHandler::new(roles.clone()),
            roles,
            InMemoryPermissionRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_handle_get_not_found() {
        let (handler, _, _) = setup();
        let err = handler.handle_get(RoleId(1)).await.unwrap_err();
        assert_eq!(err.to_string(), "Not found: Role with id 1 not found");
    }

    #[tokio::test]
    async fn test_handle_get_expanded_sorted_by_name() {
        let (handler, roles, permissions) = setup();
        let write = permissions
            .save(&Permission::new("users.write", "Write users").unwrap())
            .await
            .unwrap();
        let read = permissions
            .save(&Permission::new("users.read", "Read users").unwrap())
            .await
            .unwrap();
        let role = roles
            .save(
                &Role::new("admin", "Admin")
                    .with_permissions(vec![write.id().unwrap(), read.id().unwrap()]),
            )
            .await
            .unwrap();

        let (_, summaries) = handler
            .handle_get_expanded(role.id().unwrap())
            .await
            .unwrap();
        let names: Vec<&str> = summaries.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["users.read", "users.write"]);
    }

    #[tokio::test]
    async fn test_handle_list_paginated() {
        let (handler, roles, _) = setup();
        let base = Utc::now();
        for i in 0..5 {
            let mut role = Role::new(format!("role_{}", i), format!("Role {}", i));
            role.created_at = base + Duration::seconds(i);
            roles.save(&role).await.unwrap();
        }

        let page = handler
            .handle_list_paginated(PaginationRequest::new(1, 2))
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages(), 3);
        let names: Vec<&str> = page.items.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["role_4", "role_3"]);

        let last = handler
            .handle_list_paginated(PaginationRequest::new(3, 2))
            .await
            .unwrap();
        assert_eq!(last.items.len(), 1);
        assert!(!last.has_next());
    }

    #[tokio::test]
    async fn test_handle_list_paginated_rejects_bad_page() {
        let (handler, _, _) = setup();
        let err = handler
            .handle_list_paginated(PaginationRequest::new(0, 20))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_counts() {
        let (handler, roles, _) = setup();
        assert_eq!(handler.handle_count().await.unwrap(), 0);
        assert_eq!(handler.handle_count_permissions(RoleId(9)).await.unwrap(), 0);

        roles.save(&Role::new("a", "A")).await.unwrap();
        assert_eq!(handler.handle_count().await.unwrap(), 1);
    }
}
