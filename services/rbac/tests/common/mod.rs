//! 集成测试共用的初始化

#![allow(dead_code)]

use std::sync::Arc;

use sqlx::PgPool;
use tessera_rbac::{
    Entity, Permission, PermissionId, PermissionRepository, PostgresPermissionRepository,
    PostgresUnitOfWorkFactory, Rbac, install_schema,
};

/// 安装表结构后返回入口
pub async fn setup(pool: PgPool) -> Rbac {
    install_schema(&pool).await.expect("Failed to install schema");
    Rbac::from_pool(pool)
}

pub fn permission_repo(pool: &PgPool) -> PostgresPermissionRepository {
    PostgresPermissionRepository::new(Arc::new(PostgresUnitOfWorkFactory::new(pool.clone())))
}

/// 批量创建权限，返回 ID
pub async fn seed_permissions(pool: &PgPool, specs: &[(&str, &str)]) -> Vec<PermissionId> {
    let repo = permission_repo(pool);
    let mut ids = Vec::with_capacity(specs.len());
    for (name, category) in specs {
        let permission = Permission::new(*name, *name)
            .expect("valid permission name")
            .with_category(*category);
        let saved = repo.save(&permission).await.expect("Failed to save permission");
        ids.push(saved.id().expect("saved permission has id"));
    }
    ids
}
