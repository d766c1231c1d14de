//! 权限实体

use chrono::{DateTime, Utc};
use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use tessera_domain_core::{Entity, Identity};
use tessera_errors::{AppError, AppResult};

/// 未指定分类时使用
pub const DEFAULT_CATEGORY: &str = "general";

/// 资源与操作之间的分隔符
const SEPARATOR: char = '.';

/// 权限 ID
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    Display, From, Into,
)]
#[display("{_0}")]
#[serde(transparent)]
pub struct PermissionId(pub i64);

/// 权限实体
///
/// 名称形如 `resource.action`，例如 `users.read`、`tickets.write`。
/// 名称只在构造和显式改名时校验。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    pub identity: Identity<PermissionId>,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

impl Permission {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> AppResult<Self> {
        let name = name.into();
        Self::validate_name(&name)?;
        Ok(Self {
            identity: Identity::New,
            name,
            display_name: display_name.into(),
            description: None,
            category: DEFAULT_CATEGORY.to_string(),
            created_at: Utc::now(),
        })
    }

    /// 校验 `resource.action` 格式：两段都不能为空
    pub fn validate_name(name: &str) -> AppResult<()> {
        match name.split_once(SEPARATOR) {
            Some((resource, action)) if !resource.is_empty() && !action.is_empty() => Ok(()),
            _ => Err(AppError::validation(format!(
                "Permission name '{}' must follow format 'resource.action'",
                name
            ))),
        }
    }

    pub fn with_identity(mut self, identity: Identity<PermissionId>) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// 改名并重新校验
    pub fn rename(&mut self, name: impl Into<String>) -> AppResult<()> {
        let name = name.into();
        Self::validate_name(&name)?;
        self.name = name;
        Ok(())
    }

    /// 第一个 `.` 之前的部分
    pub fn resource(&self) -> &str {
        self.name
            .split_once(SEPARATOR)
            .map_or(self.name.as_str(), |(resource, _)| resource)
    }

    /// 第一个 `.` 之后的部分
    pub fn action(&self) -> &str {
        self.name
            .split_once(SEPARATOR)
            .map_or("", |(_, action)| action)
    }
}

impl Entity for Permission {
    type Id = PermissionId;

    fn identity(&self) -> Identity<PermissionId> {
        self.identity
    }
}

/// 角色展开视图中的权限快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSummary {
    pub id: PermissionId,
    pub name: String,
    pub display_name: String,
    pub category: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_permission() {
        let perm = Permission::new("users.read", "Read users")
            .unwrap()
            .with_description("Allows reading user information")
            .with_category("users");

        assert_eq!(perm.name, "users.read");
        assert_eq!(perm.resource(), "users");
        assert_eq!(perm.action(), "read");
        assert_eq!(perm.category, "users");
        assert!(perm.identity.is_new());
        assert_eq!(perm.id(), None);
    }

    #[test]
    fn test_default_category() {
        let perm = Permission::new("tickets.write", "Write tickets").unwrap();
        assert_eq!(perm.category, DEFAULT_CATEGORY);
        assert!(perm.description.is_none());
    }

    #[test]
    fn test_invalid_names_rejected() {
        for name in ["", "users", "users:read", ".read", "users."] {
            let err = Permission::new(name, "x").unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "accepted {:?}", name);
        }
    }

    #[test]
    fn test_first_separator_splits() {
        let perm = Permission::new("reports.export.csv", "Export").unwrap();
        assert_eq!(perm.resource(), "reports");
        assert_eq!(perm.action(), "export.csv");
    }

    #[test]
    fn test_rename_validates() {
        let mut perm = Permission::new("users.read", "Read").unwrap();
        assert!(perm.rename("users").is_err());
        assert_eq!(perm.name, "users.read");

        perm.rename("members.read").unwrap();
        assert_eq!(perm.resource(), "members");
    }

    #[test]
    fn test_field_mutation_is_not_revalidated() {
        let mut perm = Permission::new("users.read", "Read").unwrap();
        perm.name = "unchecked".to_string();
        assert_eq!(perm.action(), "");
    }
}
