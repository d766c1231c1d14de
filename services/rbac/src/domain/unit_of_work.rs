//! Unit of Work 模式
//!
//! 让多个仓储调用共享同一个事务；会话级仓储每次调用各自开启一个。

use async_trait::async_trait;
use tessera_errors::AppResult;

use crate::domain::role::{PermissionGroupRepository, PermissionRepository, RoleRepository};

/// Unit of Work trait
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn roles(&self) -> &dyn RoleRepository;

    fn permissions(&self) -> &dyn PermissionRepository;

    fn permission_groups(&self) -> &dyn PermissionGroupRepository;

    /// 提交事务
    async fn commit(self: Box<Self>) -> AppResult<()>;

    /// 回滚事务
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

/// Unit of Work 工厂 trait
#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync {
    /// 开始新的事务
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>>;
}
