//! 持久化行结构
//!
//! 标量列由 `FromRow` 读取；关联成员由仓储在映射前填充。

use chrono::{DateTime, Utc};
use tessera_domain_core::Identity;

use crate::domain::role::{PermissionId, PermissionSummary};

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct RoleModel {
    /// 为 None 时由数据库生成
    pub id: Option<i64>,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    #[sqlx(skip)]
    pub permission_ids: Vec<i64>,
    #[sqlx(skip)]
    pub permission_group_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PermissionModel {
    pub id: Option<i64>,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PermissionGroupModel {
    pub id: Option<i64>,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub order: i32,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub permission_ids: Vec<i64>,
}

/// 角色展开视图中的一行权限
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PermissionSummaryRow {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub category: String,
}

impl From<PermissionSummaryRow> for PermissionSummary {
    fn from(row: PermissionSummaryRow) -> Self {
        Self {
            id: PermissionId(row.id),
            name: row.name,
            display_name: row.display_name,
            category: row.category,
        }
    }
}

/// 行上的可选主键转为实体标识
pub(crate) fn identity_of<Id: From<i64>>(id: Option<i64>) -> Identity<Id> {
    id.map_or(Identity::New, Identity::from_raw)
}
