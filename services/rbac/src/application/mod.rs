//! 应用层
//!
//! 处理器返回 `AppResult`；[`RbacService`] 把结果包装为统一响应。

pub mod dto;
pub mod permission;
pub mod permission_group;
pub mod role;
pub mod service;

pub use service::{PermissionGroupService, PermissionService, RbacService, RoleService};
