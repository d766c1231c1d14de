//! tessera-adapter-postgres - PostgreSQL 适配器
//!
//! 连接池、事务管理、schema 迁移与错误映射

mod config;
mod connection;
mod error;
mod migration;
mod transaction;

pub use config::*;
pub use connection::*;
pub use error::*;
pub use migration::*;
pub use transaction::*;
