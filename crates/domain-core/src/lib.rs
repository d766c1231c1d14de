//! domain-core - 领域核心抽象
//!
//! 实体 trait 与 "新建 / 已持久化" 两态标识

mod entity;

pub use entity::*;
