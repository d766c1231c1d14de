//! 角色实体

use chrono::{DateTime, Utc};
use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use tessera_domain_core::{Entity, Identity};

use super::permission::PermissionId;
use super::permission_group::PermissionGroupId;

/// 角色 ID
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    Display, From, Into,
)]
#[display("{_0}")]
#[serde(transparent)]
pub struct RoleId(pub i64);

/// 角色实体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub identity: Identity<RoleId>,
    /// slug，例如 `support_agent`
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub permissions: Vec<PermissionId>,
    pub permission_groups: Vec<PermissionGroupId>,
    /// 由外部的用户分配子系统提供，本层不计算
    pub user_count: i64,
    pub created_at: DateTime<Utc>,
    /// 由持久化层在更新时写入
    pub updated_at: Option<DateTime<Utc>>,
}

impl Role {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            identity: Identity::New,
            name: name.into(),
            display_name: display_name.into(),
            description: None,
            permissions: Vec::new(),
            permission_groups: Vec::new(),
            user_count: 0,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn with_identity(mut self, identity: Identity<RoleId>) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_permissions(mut self, permissions: Vec<PermissionId>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_permission_groups(mut self, groups: Vec<PermissionGroupId>) -> Self {
        self.permission_groups = groups;
        self
    }

    pub fn with_user_count(mut self, user_count: i64) -> Self {
        self.user_count = user_count;
        self
    }

    /// 直接分配的权限数量，不含权限组展开
    pub fn permission_count(&self) -> usize {
        self.permissions.len()
    }
}

impl Entity for Role {
    type Id = RoleId;

    fn identity(&self) -> Identity<RoleId> {
        self.identity
    }
}
