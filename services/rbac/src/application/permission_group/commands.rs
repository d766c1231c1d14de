//! 权限组相关请求

use serde::{Deserialize, Serialize};
use tessera_errors::{AppError, AppResult};

use crate::domain::role::{PermissionGroup, PermissionId};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePermissionGroupRequest {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub permissions: Vec<PermissionId>,
}

impl CreatePermissionGroupRequest {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("Permission group name cannot be empty"));
        }
        if self.display_name.trim().is_empty() {
            return Err(AppError::validation(
                "Permission group display name cannot be empty",
            ));
        }
        Ok(())
    }

    pub fn into_group(self) -> PermissionGroup {
        let mut group = PermissionGroup::new(self.name, self.display_name)
            .with_order(self.order)
            .with_permissions(self.permissions);
        group.description = self.description;
        group.icon = self.icon;
        group
    }
}

/// 更新权限组请求，None 的字段保持不变
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdatePermissionGroupRequest {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub order: Option<i32>,
    pub permissions: Option<Vec<PermissionId>>,
}

impl UpdatePermissionGroupRequest {
    pub fn apply_to(self, group: &mut PermissionGroup) {
        if let Some(name) = self.name {
            group.name = name;
        }
        if let Some(display_name) = self.display_name {
            group.display_name = display_name;
        }
        if let Some(description) = self.description {
            group.description = Some(description);
        }
        if let Some(icon) = self.icon {
            group.icon = Some(icon);
        }
        if let Some(order) = self.order {
            group.order = order;
        }
        if let Some(permissions) = self.permissions {
            group.permissions = permissions;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_group() {
        let group = CreatePermissionGroupRequest {
            icon: Some("users".to_string()),
            order: 2,
            permissions: vec![PermissionId(1)],
            ..CreatePermissionGroupRequest::new("users_management", "Users")
        }
        .into_group();

        assert_eq!(group.icon.as_deref(), Some("users"));
        assert_eq!(group.order, 2);
        assert!(group.has_permissions());
    }

    #[test]
    fn test_update_order_only() {
        let mut group = PermissionGroup::new("ops", "Ops").with_icon("gear");
        UpdatePermissionGroupRequest {
            order: Some(9),
            ..Default::default()
        }
        .apply_to(&mut group);

        assert_eq!(group.order, 9);
        assert_eq!(group.icon.as_deref(), Some("gear"));
    }
}
