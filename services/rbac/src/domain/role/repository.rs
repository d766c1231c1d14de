//! 仓储接口
//!
//! 每个方法的读写在实现侧构成一个原子单元；两次调用之间没有原子性，
//! 需要多步原子操作时直接使用 [`UnitOfWork`](crate::domain::UnitOfWork)。

use async_trait::async_trait;
use indexmap::IndexMap;
use tessera_errors::AppResult;

use super::permission::{Permission, PermissionId, PermissionSummary};
use super::permission_group::{PermissionGroup, PermissionGroupId};
use super::role::{Role, RoleId};

/// 角色仓储接口
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// 根据 ID 查找角色，不存在时返回 None
    async fn get_by_id(&self, id: &RoleId) -> AppResult<Option<Role>>;

    /// 新建或更新角色，并用实体中的列表整体替换权限与权限组成员
    ///
    /// 返回持久化后的角色（生成的 ID、时间戳和实际生效的成员），入参不被修改。
    async fn save(&self, role: &Role) -> AppResult<Role>;

    /// 删除角色，不存在时无操作
    async fn delete(&self, id: &RoleId) -> AppResult<()>;

    /// 所有角色，按名称排序
    async fn list(&self) -> AppResult<Vec<Role>>;

    /// 按创建时间倒序分页，返回当前页与总数
    async fn list_paginated(&self, page: u32, page_size: u32) -> AppResult<(Vec<Role>, u64)>;

    async fn count(&self) -> AppResult<u64>;

    /// 追加权限；已有成员和不存在的权限 ID 被忽略，角色不存在时返回 NotFound
    async fn add_permissions(
        &self,
        id: &RoleId,
        permission_ids: &[PermissionId],
    ) -> AppResult<Role>;

    /// 移除权限；未关联的 ID 被忽略，角色不存在时返回 NotFound
    async fn remove_permissions(
        &self,
        id: &RoleId,
        permission_ids: &[PermissionId],
    ) -> AppResult<Role>;

    /// 直接关联的权限数量，角色不存在时为 0
    async fn count_permissions(&self, id: &RoleId) -> AppResult<u64>;

    /// 角色及其权限快照（按权限名称排序）
    async fn get_by_id_with_permissions(
        &self,
        id: &RoleId,
    ) -> AppResult<Option<(Role, Vec<PermissionSummary>)>>;
}

/// 权限仓储接口
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    async fn get_by_id(&self, id: &PermissionId) -> AppResult<Option<Permission>>;

    /// 新建或更新权限（只有标量字段）
    async fn save(&self, permission: &Permission) -> AppResult<Permission>;

    /// 删除权限，不存在时无操作；关联行级联删除
    async fn delete(&self, id: &PermissionId) -> AppResult<()>;

    /// 所有权限，按 (category, name) 排序
    async fn list(&self) -> AppResult<Vec<Permission>>;

    async fn count(&self) -> AppResult<u64>;

    /// 按分类分组，分类顺序为首次出现顺序
    async fn group_by_category(&self) -> AppResult<IndexMap<String, Vec<Permission>>>;
}

/// 权限组仓储接口
#[async_trait]
pub trait PermissionGroupRepository: Send + Sync {
    async fn get_by_id(&self, id: &PermissionGroupId) -> AppResult<Option<PermissionGroup>>;

    /// 新建或更新权限组，并用实体中的列表整体替换成员权限
    async fn save(&self, group: &PermissionGroup) -> AppResult<PermissionGroup>;

    async fn delete(&self, id: &PermissionGroupId) -> AppResult<()>;

    /// 所有权限组，按 (order, name) 排序
    async fn list(&self) -> AppResult<Vec<PermissionGroup>>;

    async fn count(&self) -> AppResult<u64>;

    async fn add_permissions(
        &self,
        id: &PermissionGroupId,
        permission_ids: &[PermissionId],
    ) -> AppResult<PermissionGroup>;

    async fn remove_permissions(
        &self,
        id: &PermissionGroupId,
        permission_ids: &[PermissionId],
    ) -> AppResult<PermissionGroup>;

    /// 组内权限数量，组不存在时为 0
    async fn count_permissions(&self, id: &PermissionGroupId) -> AppResult<u64>;
}
