//! 持久化层模块
//!
//! `*_store` 是在单个连接上执行的 SQL；`tx_repositories` 把它们绑定到共享事务；
//! `session_repositories` 为每次调用开启独立的 Unit of Work。

mod association;
pub mod db_metrics;
pub mod mappers;
pub mod models;
mod permission_group_store;
mod permission_store;
mod role_store;
pub mod schema;
pub mod session_repositories;
mod store;
pub mod tx_repositories;
pub mod unit_of_work;

pub use db_metrics::{DbMetrics, QueryTimer};
pub use permission_store::partition_by_category;
pub use schema::rbac_migrations;
pub use session_repositories::{
    PostgresPermissionGroupRepository, PostgresPermissionRepository, PostgresRoleRepository,
};
pub use unit_of_work::{PostgresUnitOfWork, PostgresUnitOfWorkFactory};
