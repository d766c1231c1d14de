//! 会话级仓储
//!
//! 每次调用独立开启一个 Unit of Work：成功提交，失败回滚并返回原错误。
//! 调用之间互不影响，单次调用内的多条语句原子生效。

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use tessera_errors::AppResult;
use tracing::warn;

use super::db_metrics::QueryTimer;
use super::schema::{PERMISSION_GROUPS, PERMISSIONS, ROLES};
use crate::domain::role::{
    Permission, PermissionGroup, PermissionGroupId, PermissionGroupRepository, PermissionId,
    PermissionRepository, PermissionSummary, Role, RoleId, RoleRepository,
};
use crate::domain::unit_of_work::{UnitOfWork, UnitOfWorkFactory};

/// 在新的 Unit of Work 中执行一次仓储调用
macro_rules! within_unit_of_work {
    ($factory:expr, $table:expr, $op:literal, $accessor:ident, |$repo:ident| $call:expr) => {{
        let timer = QueryTimer::new($table, $op);
        let uow = match $factory.begin().await {
            Ok(uow) => uow,
            Err(e) => {
                timer.finish_with_error();
                return Err(e);
            }
        };
        let result = {
            let $repo = uow.$accessor();
            $call.await
        };
        finish(uow, result, timer).await
    }};
}

async fn finish<T: Send>(
    uow: Box<dyn UnitOfWork>,
    result: AppResult<T>,
    timer: QueryTimer,
) -> AppResult<T> {
    match result {
        Ok(value) => match uow.commit().await {
            Ok(()) => {
                timer.finish();
                Ok(value)
            }
            Err(e) => {
                timer.finish_with_error();
                Err(e)
            }
        },
        Err(e) => {
            if let Err(rollback_err) = uow.rollback().await {
                warn!(error = %rollback_err, original = %e, "Rollback failed");
            }
            timer.finish_with_error();
            Err(e)
        }
    }
}

/// 角色仓储
pub struct PostgresRoleRepository {
    factory: Arc<dyn UnitOfWorkFactory>,
}

impl PostgresRoleRepository {
    pub fn new(factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { factory }
    }
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn get_by_id(&self, id: &RoleId) -> AppResult<Option<Role>> {
        within_unit_of_work!(self.factory, ROLES, "get_by_id", roles, |repo| repo.get_by_id(id))
    }

    async fn save(&self, role: &Role) -> AppResult<Role> {
        within_unit_of_work!(self.factory, ROLES, "save", roles, |repo| repo.save(role))
    }

    async fn delete(&self, id: &RoleId) -> AppResult<()> {
        within_unit_of_work!(self.factory, ROLES, "delete", roles, |repo| repo.delete(id))
    }

    async fn list(&self) -> AppResult<Vec<Role>> {
        within_unit_of_work!(self.factory, ROLES, "list", roles, |repo| repo.list())
    }

    async fn list_paginated(&self, page: u32, page_size: u32) -> AppResult<(Vec<Role>, u64)> {
        within_unit_of_work!(self.factory, ROLES, "list_paginated", roles, |repo| repo
            .list_paginated(page, page_size))
    }

    async fn count(&self) -> AppResult<u64> {
        within_unit_of_work!(self.factory, ROLES, "count", roles, |repo| repo.count())
    }

    async fn add_permissions(
        &self,
        id: &RoleId,
        permission_ids: &[PermissionId],
    ) -> AppResult<Role> {
        within_unit_of_work!(self.factory, ROLES, "add_permissions", roles, |repo| repo
            .add_permissions(id, permission_ids))
    }

    async fn remove_permissions(
        &self,
        id: &RoleId,
        permission_ids: &[PermissionId],
    ) -> AppResult<Role> {
        within_unit_of_work!(self.factory, ROLES, "remove_permissions", roles, |repo| repo
            .remove_permissions(id, permission_ids))
    }

    async fn count_permissions(&self, id: &RoleId) -> AppResult<u64> {
        within_unit_of_work!(self.factory, ROLES, "count_permissions", roles, |repo| repo
            .count_permissions(id))
    }

    async fn get_by_id_with_permissions(
        &self,
        id: &RoleId,
    ) -> AppResult<Option<(Role, Vec<PermissionSummary>)>> {
        within_unit_of_work!(self.factory, ROLES, "get_by_id_with_permissions", roles, |repo| repo
            .get_by_id_with_permissions(id))
    }
}

/// 权限仓储
pub struct PostgresPermissionRepository {
    factory: Arc<dyn UnitOfWorkFactory>,
}

impl PostgresPermissionRepository {
    pub fn new(factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { factory }
    }
}

#[async_trait]
impl PermissionRepository for PostgresPermissionRepository {
    async fn get_by_id(&self, id: &PermissionId) -> AppResult<Option<Permission>> {
        within_unit_of_work!(self.factory, PERMISSIONS, "get_by_id", permissions, |repo| repo
            .get_by_id(id))
    }

    async fn save(&self, permission: &Permission) -> AppResult<Permission> {
        within_unit_of_work!(self.factory, PERMISSIONS, "save", permissions, |repo| repo
            .save(permission))
    }

    async fn delete(&self, id: &PermissionId) -> AppResult<()> {
        within_unit_of_work!(self.factory, PERMISSIONS, "delete", permissions, |repo| repo
            .delete(id))
    }

    async fn list(&self) -> AppResult<Vec<Permission>> {
        within_unit_of_work!(self.factory, PERMISSIONS, "list", permissions, |repo| repo.list())
    }

    async fn count(&self) -> AppResult<u64> {
        within_unit_of_work!(self.factory, PERMISSIONS, "count", permissions, |repo| repo.count())
    }

    async fn group_by_category(&self) -> AppResult<IndexMap<String, Vec<Permission>>> {
        within_unit_of_work!(self.factory, PERMISSIONS, "group_by_category", permissions, |repo| {
            repo.group_by_category()
        })
    }
}

/// 权限组仓储
pub struct PostgresPermissionGroupRepository {
    factory: Arc<dyn UnitOfWorkFactory>,
}

impl PostgresPermissionGroupRepository {
    pub fn new(factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { factory }
    }
}

#[async_trait]
impl PermissionGroupRepository for PostgresPermissionGroupRepository {
    async fn get_by_id(&self, id: &PermissionGroupId) -> AppResult<Option<PermissionGroup>> {
        within_unit_of_work!(
            self.factory,
            PERMISSION_GROUPS,
            "get_by_id",
            permission_groups,
            |repo| repo.get_by_id(id)
        )
    }

    async fn save(&self, group: &PermissionGroup) -> AppResult<PermissionGroup> {
        within_unit_of_work!(
            self.factory,
            PERMISSION_GROUPS,
            "save",
            permission_groups,
            |repo| repo.save(group)
        )
    }

    async fn delete(&self, id: &PermissionGroupId) -> AppResult<()> {
        within_unit_of_work!(
            self.factory,
            PERMISSION_GROUPS,
            "delete",
            permission_groups,
            |repo| repo.delete(id)
        )
    }

    async fn list(&self) -> AppResult<Vec<PermissionGroup>> {
        within_unit_of_work!(
            self.factory,
            PERMISSION_GROUPS,
            "list",
            permission_groups,
            |repo| repo.list()
        )
    }

    async fn count(&self) -> AppResult<u64> {
        within_unit_of_work!(
            self.factory,
            PERMISSION_GROUPS,
            "count",
            permission_groups,
            |repo| repo.count()
        )
    }

    async fn add_permissions(
        &self,
        id: &PermissionGroupId,
        permission_ids: &[PermissionId],
    ) -> AppResult<PermissionGroup> {
        within_unit_of_work!(
            self.factory,
            PERMISSION_GROUPS,
            "add_permissions",
            permission_groups,
            |repo| repo.add_permissions(id, permission_ids)
        )
    }

    async fn remove_permissions(
        &self,
        id: &PermissionGroupId,
        permission_ids: &[PermissionId],
    ) -> AppResult<PermissionGroup> {
        within_unit_of_work!(
            self.factory,
            PERMISSION_GROUPS,
            "remove_permissions",
            permission_groups,
            |repo| repo.remove_permissions(id, permission_ids)
        )
    }

    async fn count_permissions(&self, id: &PermissionGroupId) -> AppResult<u64> {
        within_unit_of_work!(
            self.factory,
            PERMISSION_GROUPS,
            "count_permissions",
            permission_groups,
            |repo| repo.count_permissions(id)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryUnitOfWorkFactory, UowLog};
    use tessera_domain_core::Entity;
    use tessera_errors::AppError;

    fn role_repo() -> (PostgresRoleRepository, Arc<UowLog>) {
        let factory = InMemoryUnitOfWorkFactory::new();
        let log = factory.log();
        (PostgresRoleRepository::new(Arc::new(factory)), log)
    }

    #[tokio::test]
    async fn test_success_commits() {
        let (repo, log) = role_repo();

        let saved = repo.save(&Role::new("admin", "Admin")).await.unwrap();
        assert!(saved.id().is_some());
        assert_eq!(log.commits(), 1);
        assert_eq!(log.rollbacks(), 0);
    }

    #[tokio::test]
    async fn test_failure_rolls_back_and_keeps_error() {
        let (repo, log) = role_repo();

        let err = repo
            .add_permissions(&RoleId(404), &[PermissionId(1)])
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(log.commits(), 0);
        assert_eq!(log.rollbacks(), 1);
    }

    #[tokio::test]
    async fn test_each_call_gets_its_own_unit_of_work() {
        let (repo, log) = role_repo();

        repo.count().await.unwrap();
        repo.list().await.unwrap();
        repo.get_by_id(&RoleId(1)).await.unwrap();

        assert_eq!(log.begun(), 3);
        assert_eq!(log.commits(), 3);
    }

    #[tokio::test]
    async fn test_begin_failure_is_returned() {
        let factory = InMemoryUnitOfWorkFactory::new();
        factory.fail_begin();
        let log = factory.log();
        let repo = PostgresPermissionRepository::new(Arc::new(factory));

        let err = repo.count().await.unwrap_err();
        assert!(matches!(err, AppError::Unavailable(_)));
        assert_eq!(log.commits() + log.rollbacks(), 0);
    }

    #[tokio::test]
    async fn test_group_repository_goes_through_unit_of_work() {
        let factory = InMemoryUnitOfWorkFactory::new();
        let log = factory.log();
        let repo = PostgresPermissionGroupRepository::new(Arc::new(factory));

        let group = repo.save(&PermissionGroup::new("ops", "Ops")).await.unwrap();
        let id = group.id().unwrap();
        assert_eq!(repo.count_permissions(&id).await.unwrap(), 0);
        assert_eq!(log.commits(), 2);
    }
}
