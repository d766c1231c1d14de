//! 事务内仓储
//!
//! 三个仓储共享同一个事务，由 [`PostgresUnitOfWork`](super::PostgresUnitOfWork) 创建。

use async_trait::async_trait;
use indexmap::IndexMap;
use sqlx::{PgConnection, Postgres, Transaction};
use std::sync::Arc;
use tessera_errors::{AppError, AppResult};
use tokio::sync::{Mutex, MutexGuard};

use super::{permission_group_store, permission_store, role_store};
use crate::domain::role::{
    Permission, PermissionGroup, PermissionGroupId, PermissionGroupRepository, PermissionId,
    PermissionRepository, PermissionSummary, Role, RoleId, RoleRepository,
};

/// 共享事务
pub type SharedTx = Arc<Mutex<Option<Transaction<'static, Postgres>>>>;

/// 取出仍在进行中的事务连接
fn active<'a>(
    guard: &'a mut MutexGuard<'_, Option<Transaction<'static, Postgres>>>,
) -> AppResult<&'a mut PgConnection> {
    guard
        .as_mut()
        .map(|tx| &mut **tx)
        .ok_or_else(|| AppError::internal("Transaction consumed"))
}

macro_rules! define_tx_repo {
    ($name:ident) => {
        pub struct $name {
            tx: SharedTx,
        }

        impl $name {
            pub fn new(tx: SharedTx) -> Self {
                Self { tx }
            }
        }
    };
}

define_tx_repo!(TxRoleRepository);
define_tx_repo!(TxPermissionRepository);
define_tx_repo!(TxPermissionGroupRepository);

#[async_trait]
impl RoleRepository for TxRoleRepository {
    async fn get_by_id(&self, id: &RoleId) -> AppResult<Option<Role>> {
        let mut guard = self.tx.lock().await;
        role_store::find(active(&mut guard)?, *id).await
    }

    async fn save(&self, role: &Role) -> AppResult<Role> {
        let mut guard = self.tx.lock().await;
        role_store::save(active(&mut guard)?, role).await
    }

    async fn delete(&self, id: &RoleId) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        role_store::delete(active(&mut guard)?, *id).await
    }

    async fn list(&self) -> AppResult<Vec<Role>> {
        let mut guard = self.tx.lock().await;
        role_store::list(active(&mut guard)?).await
    }

    async fn list_paginated(&self, page: u32, page_size: u32) -> AppResult<(Vec<Role>, u64)> {
        let mut guard = self.tx.lock().await;
        role_store::list_paginated(active(&mut guard)?, page, page_size).await
    }

    async fn count(&self) -> AppResult<u64> {
        let mut guard = self.tx.lock().await;
        role_store::count(active(&mut guard)?).await
    }

    async fn add_permissions(
        &self,
        id: &RoleId,
        permission_ids: &[PermissionId],
    ) -> AppResult<Role> {
        let mut guard = self.tx.lock().await;
        role_store::add_permissions(active(&mut guard)?, *id, permission_ids).await
    }

    async fn remove_permissions(
        &self,
        id: &RoleId,
        permission_ids: &[PermissionId],
    ) -> AppResult<Role> {
        let mut guard = self.tx.lock().await;
        role_store::remove_permissions(active(&mut guard)?, *id, permission_ids).await
    }

    async fn count_permissions(&self, id: &RoleId) -> AppResult<u64> {
        let mut guard = self.tx.lock().await;
        role_store::count_permissions(active(&mut guard)?, *id).await
    }

    async fn get_by_id_with_permissions(
        &self,
        id: &RoleId,
    ) -> AppResult<Option<(Role, Vec<PermissionSummary>)>> {
        let mut guard = self.tx.lock().await;
        role_store::find_with_permissions(active(&mut guard)?, *id).await
    }
}

#[async_trait]
impl PermissionRepository for TxPermissionRepository {
    async fn get_by_id(&self, id: &PermissionId) -> AppResult<Option<Permission>> {
        let mut guard = self.tx.lock().await;
        permission_store::find(active(&mut guard)?, *id).await
    }

    async fn save(&self, permission: &Permission) -> AppResult<Permission> {
        let mut guard = self.tx.lock().await;
        permission_store::save(active(&mut guard)?, permission).await
    }

    async fn delete(&self, id: &PermissionId) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        permission_store::delete(active(&mut guard)?, *id).await
    }

    async fn list(&self) -> AppResult<Vec<Permission>> {
        let mut guard = self.tx.lock().await;
        permission_store::list(active(&mut guard)?).await
    }

    async fn count(&self) -> AppResult<u64> {
        let mut guard = self.tx.lock().await;
        permission_store::count(active(&mut guard)?).await
    }

    async fn group_by_category(&self) -> AppResult<IndexMap<String, Vec<Permission>>> {
        let mut guard = self.tx.lock().await;
        permission_store::group_by_category(active(&mut guard)?).await
    }
}

#[async_trait]
impl PermissionGroupRepository for TxPermissionGroupRepository {
    async fn get_by_id(&self, id: &PermissionGroupId) -> AppResult<Option<PermissionGroup>> {
        let mut guard = self.tx.lock().await;
        permission_group_store::find(active(&mut guard)?, *id).await
    }

    async fn save(&self, group: &PermissionGroup) -> AppResult<PermissionGroup> {
        let mut guard = self.tx.lock().await;
        permission_group_store::save(active(&mut guard)?, group).await
    }

    async fn delete(&self, id: &PermissionGroupId) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        permission_group_store::delete(active(&mut guard)?, *id).await
    }

    async fn list(&self) -> AppResult<Vec<PermissionGroup>> {
        let mut guard = self.tx.lock().await;
        permission_group_store::list(active(&mut guard)?).await
    }

    async fn count(&self) -> AppResult<u64> {
        let mut guard = self.tx.lock().await;
        permission_group_store::count(active(&mut guard)?).await
    }

    async fn add_permissions(
        &self,
        id: &PermissionGroupId,
        permission_ids: &[PermissionId],
    ) -> AppResult<PermissionGroup> {
        let mut guard = self.tx.lock().await;
        permission_group_store::add_permissions(active(&mut guard)?, *id, permission_ids).await
    }

    async fn remove_permissions(
        &self,
        id: &PermissionGroupId,
        permission_ids: &[PermissionId],
    ) -> AppResult<PermissionGroup> {
        let mut guard = self.tx.lock().await;
        permission_group_store::remove_permissions(active(&mut guard)?, *id, permission_ids).await
    }

    async fn count_permissions(&self, id: &PermissionGroupId) -> AppResult<u64> {
        let mut guard = self.tx.lock().await;
        permission_group_store::count_permissions(active(&mut guard)?, *id).await
    }
}
