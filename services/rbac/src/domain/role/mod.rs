//! RBAC 角色权限领域模块

#![allow(clippy::module_inception)]

pub mod permission;
pub mod permission_group;
pub mod repository;
pub mod role;

pub use permission::{DEFAULT_CATEGORY, Permission, PermissionId, PermissionSummary};
pub use permission_group::{PermissionGroup, PermissionGroupId};
pub use repository::{PermissionGroupRepository, PermissionRepository, RoleRepository};
pub use role::{Role, RoleId};
