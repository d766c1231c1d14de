//! 角色相关请求

use serde::{Deserialize, Serialize};
use tessera_errors::{AppError, AppResult};

use crate::domain::role::{PermissionGroupId, PermissionId, Role};

/// 创建角色请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<PermissionId>,
    #[serde(default)]
    pub permission_groups: Vec<PermissionGroupId>,
}

impl CreateRoleRequest {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("Role name cannot be empty"));
        }
        if self.display_name.trim().is_empty() {
            return Err(AppError::validation("Role display name cannot be empty"));
        }
        Ok(())
    }

    pub fn into_role(self) -> Role {
        let role = Role::new(self.name, self.display_name)
            .with_permissions(self.permissions)
            .with_permission_groups(self.permission_groups);
        match self.description {
            Some(description) => role.with_description(description),
            None => role,
        }
    }
}

/// 更新角色请求，None 的字段保持不变；给出的成员列表整体替换原有成员
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub permissions: Option<Vec<PermissionId>>,
    pub permission_groups: Option<Vec<PermissionGroupId>>,
}

impl UpdateRoleRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::validation("Role name cannot be empty"));
        }
        if self
            .display_name
            .as_deref()
            .is_some_and(|n| n.trim().is_empty())
        {
            return Err(AppError::validation("Role display name cannot be empty"));
        }
        Ok(())
    }

    pub fn apply_to(self, role: &mut Role) {
        if let Some(name) = self.name {
            role.name = name;
        }
        if let Some(display_name) = self.display_name {
            role.display_name = display_name;
        }
        if let Some(description) = self.description {
            role.description = Some(description);
        }
        if let Some(permissions) = self.permissions {
            role.permissions = permissions;
        }
        if let Some(groups) = self.permission_groups {
            role.permission_groups = groups;
        }
    }
}
