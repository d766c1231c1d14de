//! PostgreSQL Unit of Work 实现

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;
use tessera_adapter_postgres::{TransactionManager, TransactionOptions};
use tessera_errors::{AppError, AppResult};
use tokio::sync::Mutex;
use tracing::debug;

use super::tx_repositories::{
    SharedTx, TxPermissionGroupRepository, TxPermissionRepository, TxRoleRepository,
};
use crate::domain::role::{PermissionGroupRepository, PermissionRepository, RoleRepository};
use crate::domain::unit_of_work::{UnitOfWork, UnitOfWorkFactory};

/// Postgres Unit of Work 工厂
pub struct PostgresUnitOfWorkFactory {
    manager: TransactionManager,
    options: TransactionOptions,
}

impl PostgresUnitOfWorkFactory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            manager: TransactionManager::new(pool),
            options: TransactionOptions::default(),
        }
    }

    /// 指定隔离级别等事务选项
    pub fn with_options(mut self, options: TransactionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn pool(&self) -> &PgPool {
        self.manager.pool()
    }
}

#[async_trait]
impl UnitOfWorkFactory for PostgresUnitOfWorkFactory {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let tx = self.manager.begin_with_options(&self.options).await?;
        Ok(Box::new(PostgresUnitOfWork::new(tx)))
    }
}

/// Postgres Unit of Work 实现
pub struct PostgresUnitOfWork {
    tx: SharedTx,
    role_repo: TxRoleRepository,
    permission_repo: TxPermissionRepository,
    permission_group_repo: TxPermissionGroupRepository,
}

impl PostgresUnitOfWork {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        let tx: SharedTx = Arc::new(Mutex::new(Some(tx)));

        Self {
            role_repo: TxRoleRepository::new(tx.clone()),
            permission_repo: TxPermissionRepository::new(tx.clone()),
            permission_group_repo: TxPermissionGroupRepository::new(tx.clone()),
            tx,
        }
    }

    async fn take(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.tx
            .lock()
            .await
            .take()
            .ok_or_else(|| AppError::internal("Transaction already consumed"))
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    fn roles(&self) -> &dyn RoleRepository {
        &self.role_repo
    }

    fn permissions(&self) -> &dyn PermissionRepository {
        &self.permission_repo
    }

    fn permission_groups(&self) -> &dyn PermissionGroupRepository {
        &self.permission_group_repo
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let tx = self.take().await?;
        TransactionManager::commit(tx).await?;
        debug!("Unit of work committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        let tx = self.take().await?;
        TransactionManager::rollback(tx).await?;
        debug!("Unit of work rolled back");
        Ok(())
    }
}
