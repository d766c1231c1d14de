//! tessera-rbac - 基于 PostgreSQL 的角色/权限/权限组数据访问层
//!
//! 分层：
//! - `domain`：实体、仓储接口、Unit of Work 接口
//! - `infrastructure`：SQL、映射、事务内仓储与会话级仓储
//! - `application`：请求/响应结构、命令与查询处理器、统一响应包装
//!
//! [`Rbac`] 是入口：持有连接池，组装好各层。

pub mod application;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use tessera_adapter_postgres::{
    MigrationManager, MigrationResult, PostgresConfig, check_connection, create_pool,
};
use tessera_config::{DatabaseConfig, RbacConfig, TelemetryConfig};
use tessera_errors::{AppError, AppResult};
use tracing::info;

pub use application::dto;
pub use application::{PermissionGroupService, PermissionService, RbacService, RoleService};
pub use domain::role::{
    DEFAULT_CATEGORY, Permission, PermissionGroup, PermissionGroupId, PermissionGroupRepository,
    PermissionId, PermissionRepository, PermissionSummary, Role, RoleId, RoleRepository,
};
pub use domain::{UnitOfWork, UnitOfWorkFactory};
pub use infrastructure::persistence::{
    PostgresPermissionGroupRepository, PostgresPermissionRepository, PostgresRoleRepository,
    PostgresUnitOfWorkFactory, rbac_migrations,
};
pub use tessera_domain_core::{Entity, Identity};
pub use tessera_telemetry::PrometheusHandle;

const POOL_NAME: &str = "rbac";

/// 按配置初始化日志
pub fn init_telemetry(config: &TelemetryConfig) -> AppResult<()> {
    tessera_telemetry::init(&config.log_level, config.json)
        .map_err(|e| AppError::internal(format!("Failed to initialize telemetry: {}", e)))
}

/// 安装 Prometheus recorder，`DbMetrics` 的指标由返回的 handle 导出
pub fn init_metrics() -> AppResult<PrometheusHandle> {
    tessera_telemetry::init_metrics()
        .map_err(|e| AppError::internal(format!("Failed to initialize metrics: {}", e)))
}

/// 安装或升级 RBAC 表结构
pub async fn install_schema(pool: &PgPool) -> AppResult<MigrationResult> {
    let manager = MigrationManager::new(pool.clone());
    manager.init().await?;
    let result = manager.migrate_strict(&rbac_migrations()).await?;
    info!(
        applied = result.applied_count(),
        skipped = result.skipped.len(),
        "RBAC schema up to date"
    );
    Ok(result)
}

fn postgres_config(app_name: &str, database: &DatabaseConfig) -> PostgresConfig {
    PostgresConfig::new(database.url.expose_secret())
        .with_pool(database.min_connections, database.max_connections)
        .with_acquire_timeout(database.acquire_timeout())
        .with_idle_timeout(database.idle_timeout())
        .with_application_name(app_name)
        .with_retry(
            database.connect_retries,
            Duration::from_millis(500),
            Duration::from_secs(10),
        )
}

/// RBAC 入口
///
/// 持有连接池；没有全局状态，可以同时存在多个实例。
pub struct Rbac {
    pool: PgPool,
    uow_factory: Arc<PostgresUnitOfWorkFactory>,
    service: RbacService,
}

impl Rbac {
    /// 建立连接池（带重试），按需执行迁移，然后组装各层
    pub async fn connect(config: &RbacConfig) -> AppResult<Self> {
        let pool = create_pool(&postgres_config(&config.app_name, &config.database)).await?;
        if config.database.run_migrations {
            install_schema(&pool).await?;
        }
        info!(app = %config.app_name, env = %config.app_env, "RBAC initialized");
        Ok(Self::from_pool(pool))
    }

    /// 使用已有的连接池，不执行迁移
    pub fn from_pool(pool: PgPool) -> Self {
        let uow_factory = Arc::new(PostgresUnitOfWorkFactory::new(pool.clone()));
        let factory: Arc<dyn UnitOfWorkFactory> = uow_factory.clone();

        let service = RbacService::new(
            Arc::new(PostgresRoleRepository::new(factory.clone())),
            Arc::new(PostgresPermissionRepository::new(factory.clone())),
            Arc::new(PostgresPermissionGroupRepository::new(factory)),
        );

        Self {
            pool,
            uow_factory,
            service,
        }
    }

    pub fn roles(&self) -> &RoleService {
        self.service.roles()
    }

    pub fn permissions(&self) -> &PermissionService {
        self.service.permissions()
    }

    pub fn permission_groups(&self) -> &PermissionGroupService {
        self.service.permission_groups()
    }

    pub fn service(&self) -> &RbacService {
        &self.service
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 开启一个显式事务，多个仓储调用在其中原子生效，需要调用方提交
    pub async fn unit_of_work(&self) -> AppResult<Box<dyn UnitOfWork>> {
        self.uow_factory.begin().await
    }

    /// 执行 `SELECT 1` 并记录连接池状态
    pub async fn health_check(&self) -> AppResult<()> {
        infrastructure::persistence::DbMetrics::record_pool_state(&self.pool, POOL_NAME);
        check_connection(&self.pool).await
    }

    /// 关闭连接池
    pub async fn close(self) {
        self.pool.close().await;
        info!("RBAC connection pool closed");
    }
}
