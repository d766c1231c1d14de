//! 权限相关请求

use serde::{Deserialize, Serialize};
use tessera_errors::{AppError, AppResult};

use crate::domain::role::{DEFAULT_CATEGORY, Permission};

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// 创建权限请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePermissionRequest {
    /// `resource.action`
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_category")]
    pub category: String,
}

impl CreatePermissionRequest {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            description: None,
            category: default_category(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn into_permission(self) -> AppResult<Permission> {
        if self.display_name.trim().is_empty() {
            return Err(AppError::validation("Permission display name cannot be empty"));
        }
        let permission =
            Permission::new(self.name, self.display_name)?.with_category(self.category);
        Ok(match self.description {
            Some(description) => permission.with_description(description),
            None => permission,
        })
    }
}

/// 更新权限请求，None 的字段保持不变
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdatePermissionRequest {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

impl UpdatePermissionRequest {
    /// 改名时重新校验格式，失败时实体不变
    pub fn apply_to(self, permission: &mut Permission) -> AppResult<()> {
        if let Some(name) = self.name {
            permission.rename(name)?;
        }
        if let Some(display_name) = self.display_name {
            permission.display_name = display_name;
        }
        if let Some(description) = self.description {
            permission.description = Some(description);
        }
        if let Some(category) = self.category {
            permission.category = category;
        }
        Ok(())
    }
}
