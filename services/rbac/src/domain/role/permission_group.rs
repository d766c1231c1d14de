//! 权限组实体

use chrono::{DateTime, Utc};
use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use tessera_domain_core::{Entity, Identity};

use super::permission::PermissionId;

/// 权限组 ID
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    Display, From, Into,
)]
#[display("{_0}")]
#[serde(transparent)]
pub struct PermissionGroupId(pub i64);

/// 权限组
///
/// 为界面展示聚合相关权限，例如 "用户管理"、"工单管理"。
/// `permissions` 是成员权限的 ID 列表，每次读取时由关联表重新计算。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionGroup {
    pub identity: Identity<PermissionGroupId>,
    /// slug，例如 `users_management`
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    /// 界面图标名
    pub icon: Option<String>,
    /// 界面排序键，可重复
    pub order: i32,
    pub permissions: Vec<PermissionId>,
    pub created_at: DateTime<Utc>,
}

impl PermissionGroup {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            identity: Identity::New,
            name: name.into(),
            display_name: display_name.into(),
            description: None,
            icon: None,
            order: 0,
            permissions: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_identity(mut self, identity: Identity<PermissionGroupId>) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_permissions(mut self, permissions: Vec<PermissionId>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn has_permissions(&self) -> bool {
        !self.permissions.is_empty()
    }

    pub fn permission_count(&self) -> usize {
        self.permissions.len()
    }
}

impl Entity for PermissionGroup {
    type Id = PermissionGroupId;

    fn identity(&self) -> Identity<PermissionGroupId> {
        self.identity
    }
}
