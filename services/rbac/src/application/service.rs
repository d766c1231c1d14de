//! RBAC 服务
//!
//! 组合各处理器，所有结果转换为 [`BaseResponse`] / [`PaginatedResponse`]，错误以消息返回。

use std::sync::Arc;

use indexmap::IndexMap;

use super::dto::*;
use super::permission::{
    CreatePermissionRequest, PermissionCommandHandler, PermissionQueryHandler,
    UpdatePermissionRequest,
};
use super::permission_group::{
    CreatePermissionGroupRequest, PermissionGroupCommandHandler, PermissionGroupQueryHandler,
    UpdatePermissionGroupRequest,
};
use super::role::{CreateRoleRequest, RoleCommandHandler, RoleQueryHandler, UpdateRoleRequest};
use crate::domain::role::{
    PermissionGroupId, PermissionGroupRepository, PermissionId, PermissionRepository, RoleId,
    RoleRepository,
};

/// 角色用例
pub struct RoleService {
    commands: RoleCommandHandler<dyn RoleRepository>,
    queries: RoleQueryHandler<dyn RoleRepository>,
}

impl RoleService {
    pub fn new(repo: Arc<dyn RoleRepository>) -> Self {
        Self {
            commands: RoleCommandHandler::new(repo.clone()),
            queries: RoleQueryHandler::new(repo),
        }
    }

    pub fn commands(&self) -> &RoleCommandHandler<dyn RoleRepository> {
        &self.commands
    }

    pub fn queries(&self) -> &RoleQueryHandler<dyn RoleRepository> {
        &self.queries
    }

    pub async fn create(&self, request: CreateRoleRequest) -> BaseResponse<RoleResponse> {
        self.commands.handle_create(request).await.map(RoleResponse::from).into()
    }

    pub async fn update(
        &self,
        id: RoleId,
        request: UpdateRoleRequest,
    ) -> BaseResponse<RoleResponse> {
        self.commands
            .handle_update(id, request)
            .await
            .map(RoleResponse::from)
            .into()
    }

    pub async fn delete(&self, id: RoleId) -> BaseResponse<()> {
        self.commands.handle_delete(id).await.into()
    }

    pub async fn add_permissions(
        &self,
        id: RoleId,
        permission_ids: &[PermissionId],
    ) -> BaseResponse<RoleResponse> {
        self.commands
            .handle_add_permissions(id, permission_ids)
            .await
            .map(RoleResponse::from)
            .into()
    }

    pub async fn remove_permissions(
        &self,
        id: RoleId,
        permission_ids: &[PermissionId],
    ) -> BaseResponse<RoleResponse> {
        self.commands
            .handle_remove_permissions(id, permission_ids)
            .await
            .map(RoleResponse::from)
            .into()
    }

    pub async fn get(&self, id: RoleId) -> BaseResponse<RoleResponse> {
        self.queries.handle_get(id).await.map(RoleResponse::from).into()
    }

    pub async fn get_expanded(&self, id: RoleId) -> BaseResponse<RoleExpandedResponse> {
        self.queries
            .handle_get_expanded(id)
            .await
            .map(RoleExpandedResponse::from)
            .into()
    }

    pub async fn list(&self) -> BaseResponse<Vec<RoleResponse>> {
        self.queries
            .handle_list()
            .await
            .map(|roles| roles.into_iter().map(RoleResponse::from).collect::<Vec<_>>())
            .into()
    }

    pub async fn list_paginated(
        &self,
        request: PaginationRequest,
    ) -> PaginatedResponse<RoleResponse> {
        match self.queries.handle_list_paginated(request).await {
            Ok(page) => PaginatedResponse::ok(page.map(RoleResponse::from)),
            Err(e) => PaginatedResponse::fail(&request, e.to_string()),
        }
    }

    pub async fn count(&self) -> BaseResponse<u64> {
        self.queries.handle_count().await.into()
    }

    pub async fn count_permissions(&self, id: RoleId) -> BaseResponse<u64> {
        self.queries.handle_count_permissions(id).await.into()
    }
}

/// 权限用例
pub struct PermissionService {
    commands: PermissionCommandHandler<dyn PermissionRepository>,
    queries: PermissionQueryHandler<dyn PermissionRepository>,
}

impl PermissionService {
    pub fn new(repo: Arc<dyn PermissionRepository>) -> Self {
        Self {
            commands: PermissionCommandHandler::new(repo.clone()),
            queries: PermissionQueryHandler::new(repo),
        }
    }

    pub fn commands(&self) -> &PermissionCommandHandler<dyn PermissionRepository> {
        &self.commands
    }

    pub fn queries(&self) -> &PermissionQueryHandler<dyn PermissionRepository> {
        &self.queries
    }

    pub async fn create(
        &self,
        request: CreatePermissionRequest,
    ) -> BaseResponse<PermissionResponse> {
        self.commands.handle_create(request).await.map(PermissionResponse::from).into()
    }

    pub async fn update(
        &self,
        id: PermissionId,
        request: UpdatePermissionRequest,
    ) -> BaseResponse<PermissionResponse> {
        self.commands
            .handle_update(id, request)
            .await
            .map(PermissionResponse::from)
            .into()
    }

    pub async fn delete(&self, id: PermissionId) -> BaseResponse<()> {
        self.commands.handle_delete(id).await.into()
    }

    pub async fn get(&self, id: PermissionId) -> BaseResponse<PermissionResponse> {
        self.queries.handle_get(id).await.map(PermissionResponse::from).into()
    }

    pub async fn list(&self) -> BaseResponse<Vec<PermissionResponse>> {
        self.queries
            .handle_list()
            .await
            .map(|permissions| {
                permissions
                    .into_iter()
                    .map(PermissionResponse::from)
                    .collect::<Vec<_>>()
            })
            .into()
    }

    pub async fn grouped(&self) -> BaseResponse<IndexMap<String, Vec<PermissionResponse>>> {
        self.queries
            .handle_grouped()
            .await
            .map(|grouped| {
                grouped
                    .into_iter()
                    .map(|(category, permissions)| {
                        let permissions = permissions
                            .into_iter()
                            .map(PermissionResponse::from)
                            .collect::<Vec<_>>();
                        (category, permissions)
                    })
                    .collect::<IndexMap<_, _>>()
            })
            .into()
    }
}

/// 权限组用例
pub struct PermissionGroupService {
    commands: PermissionGroupCommandHandler<dyn PermissionGroupRepository>,
    queries: PermissionGroupQueryHandler<dyn PermissionGroupRepository>,
}

impl PermissionGroupService {
    pub fn new(repo: Arc<dyn PermissionGroupRepository>) -> Self {
        Self {
            commands: PermissionGroupCommandHandler::new(repo.clone()),
            queries: PermissionGroupQueryHandler::new(repo),
        }
    }

    pub fn commands(&self) -> &PermissionGroupCommandHandler<dyn PermissionGroupRepository> {
        &self.commands
    }

    pub fn queries(&self) -> &PermissionGroupQueryHandler<dyn PermissionGroupRepository> {
        &self.queries
    }

    pub async fn create(
        &self,
        request: CreatePermissionGroupRequest,
    ) -> BaseResponse<PermissionGroupResponse> {
        self.commands
            .handle_create(request)
            .await
            .map(PermissionGroupResponse::from)
            .into()
    }

    pub async fn update(
        &self,
        id: PermissionGroupId,
        request: UpdatePermissionGroupRequest,
    ) -> BaseResponse<PermissionGroupResponse> {
        self.commands
            .handle_update(id, request)
            .await
            .map(PermissionGroupResponse::from)
            .into()
    }

    pub async fn delete(&self, id: PermissionGroupId) -> BaseResponse<()> {
        self.commands.handle_delete(id).await.into()
    }

    pub async fn add_permissions(
        &self,
        id: PermissionGroupId,
        permission_ids: &[PermissionId],
    ) -> BaseResponse<PermissionGroupResponse> {
        self.commands
            .handle_add_permissions(id, permission_ids)
            .await
            .map(PermissionGroupResponse::from)
            .into()
    }

    pub async fn remove_permissions(
        &self,
        id: PermissionGroupId,
        permission_ids: &[PermissionId],
    ) -> BaseResponse<PermissionGroupResponse> {
        self.commands
            .handle_remove_permissions(id, permission_ids)
            .await
            .map(PermissionGroupResponse::from)
            .into()
    }

    pub async fn get(&self, id: PermissionGroupId) -> BaseResponse<PermissionGroupResponse> {
        self.queries.handle_get(id).await.map(PermissionGroupResponse::from).into()
    }

    pub async fn list(&self) -> BaseResponse<Vec<PermissionGroupResponse>> {
        self.queries
            .handle_list()
            .await
            .map(|groups| {
                groups
                    .into_iter()
                    .map(PermissionGroupResponse::from)
                    .collect::<Vec<_>>()
            })
            .into()
    }

    pub async fn count(&self) -> BaseResponse<u64> {
        self.queries.handle_count().await.into()
    }

    pub async fn count_permissions(&self, id: PermissionGroupId) -> BaseResponse<u64> {
        self.queries.handle_count_permissions(id).await.into()
    }
}

/// 三组用例的组合
pub struct RbacService {
    roles: RoleService,
    permissions: PermissionService,
    permission_groups: PermissionGroupService,
}

impl RbacService {
    pub fn new(
        role_repo: Arc<dyn RoleRepository>,
        permission_repo: Arc<dyn PermissionRepository>,
        permission_group_repo: Arc<dyn PermissionGroupRepository>,
    ) -> Self {
        Self {
            roles: RoleService::new(role_repo),
            permissions: PermissionService::new(permission_repo),
            permission_groups: PermissionGroupService::new(permission_group_repo),
        }
    }

    pub fn roles(&self) -> &RoleService {
        &self.roles
    }

    pub fn permissions(&self) -> &PermissionService {
        &self.permissions
    }

    pub fn permission_groups(&self) -> &PermissionGroupService {
        &self.permission_groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        InMemoryDb, InMemoryPermissionGroupRepository, InMemoryPermissionRepository,
        InMemoryRoleRepository,
    };

    fn service() -> RbacService {
        let db = InMemoryDb::new();
        RbacService::new(
            Arc::new(InMemoryRoleRepository::new(db.clone())),
            Arc::new(InMemoryPermissionRepository::new(db.clone())),
            Arc::new(InMemoryPermissionGroupRepository::new(db)),
        )
    }

    #[tokio::test]
    async fn test_envelopes_wrap_success_and_failure() {
        let service = service();

        let created = service
            .roles()
            .create(CreateRoleRequest::new("admin", "Admin"))
            .await;
        assert!(created.success);
        let id = created.data.and_then(|r| r.id).unwrap();

        let missing = service.roles().get(RoleId(id.0 + 100)).await;
        assert!(!missing.success);
        assert!(missing.error.unwrap().contains("not found"));

        let duplicate = service
            .roles()
            .create(CreateRoleRequest::new("admin", "Admin again"))
            .await;
        assert!(!duplicate.success);
        assert!(duplicate.error.unwrap().starts_with("Conflict"));
    }

    #[tokio::test]
    async fn test_expanded_role_response() {
        let service = service();
        let permission = service
            .permissions()
            .create(CreatePermissionRequest::new("users.read", "Read users").with_category("users"))
            .await
            .data
            .unwrap();
        let permission_id = permission.id.unwrap();

        let mut request = CreateRoleRequest::new("viewer", "Viewer");
        request.permissions = vec![permission_id];
        let role = service.roles().create(request).await.data.unwrap();

        let expanded = service.roles().get_expanded(role.id.unwrap()).await;
        let expanded = expanded.data.unwrap();
        assert_eq!(expanded.role.permissions, vec![permission_id]);
        assert_eq!(expanded.permission_details[0].category, "users");
        assert_eq!(
            service.roles().count_permissions(role.id.unwrap()).await.data,
            Some(1)
        );
    }

    #[tokio::test]
    async fn test_paginated_failure_keeps_request_page() {
        let service = service();
        let response = service
            .roles()
            .list_paginated(PaginationRequest::new(1, 500))
            .await;

        assert!(!response.success);
        assert!(response.data.is_empty());
        assert_eq!(response.pagination.page_size, 500);
        assert_eq!(response.pagination.total_pages, 1);
    }

    #[tokio::test]
    async fn test_paginated_empty_table() {
        let response = service()
            .roles()
            .list_paginated(PaginationRequest::default())
            .await;

        assert!(response.success);
        assert_eq!(response.pagination.total_items, 0);
        assert_eq!(response.pagination.total_pages, 1);
        assert!(!response.pagination.has_next);
    }

    #[tokio::test]
    async fn test_group_response_reports_count() {
        let service = service();
        let group = service
            .permission_groups()
            .create(CreatePermissionGroupRequest::new("ops", "Ops"))
            .await
            .data
            .unwrap();
        assert_eq!(group.permission_count, 0);

        let deleted = service.permission_groups().delete(group.id.unwrap()).await;
        assert!(deleted.success);
        assert_eq!(service.permission_groups().count().await.data, Some(0));
    }

    #[tokio::test]
    async fn test_grouped_permissions_response() {
        let service = service();
        service
            .permissions()
            .create(CreatePermissionRequest::new("users.read", "Read"))
            .await;

        let grouped = service.permissions().grouped().await.data.unwrap();
        assert_eq!(grouped["general"].len(), 1);
    }
}
