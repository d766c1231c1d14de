//! 对外的请求/响应结构与统一响应包装

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tessera_common::{PagedResult, Pagination};
use tessera_domain_core::Entity;
use tessera_errors::{AppError, AppResult};

use crate::domain::role::{
    Permission, PermissionGroup, PermissionGroupId, PermissionId, PermissionSummary, Role, RoleId,
};

/// 单页最大条数
pub const MAX_PAGE_SIZE: u32 = 100;

/// 分页请求
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationRequest {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PaginationRequest {
    fn default() -> Self {
        let defaults = Pagination::default();
        Self {
            page: defaults.page,
            page_size: defaults.page_size,
        }
    }
}

impl PaginationRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.page < 1 {
            return Err(AppError::validation("Page must be at least 1"));
        }
        if self.page_size < 1 || self.page_size > MAX_PAGE_SIZE {
            return Err(AppError::validation(format!(
                "Page size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        Ok(())
    }

    pub fn to_pagination(self) -> Pagination {
        Pagination::new(self.page, self.page_size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationResponse {
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationResponse {
    pub fn from_paged<T>(paged: &PagedResult<T>) -> Self {
        Self {
            page: paged.page,
            page_size: paged.page_size,
            total_pages: paged.total_pages(),
            total_items: paged.total,
            has_next: paged.has_next(),
            has_prev: paged.has_prev(),
        }
    }

    /// 请求失败时回显请求的页码
    pub fn empty(request: &PaginationRequest) -> Self {
        Self::from_paged(&PagedResult::<()>::new(
            Vec::new(),
            0,
            &request.to_pagination(),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleResponse {
    pub id: Option<RoleId>,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub permissions: Vec<PermissionId>,
    pub permission_groups: Vec<PermissionGroupId>,
    pub user_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self {
            id: role.id(),
            name: role.name,
            display_name: role.display_name,
            description: role.description,
            permissions: role.permissions,
            permission_groups: role.permission_groups,
            user_count: role.user_count,
            created_at: role.created_at,
            updated_at: role.updated_at,
        }
    }
}

/// 角色及其权限的完整信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleExpandedResponse {
    #[serde(flatten)]
    pub role: RoleResponse,
    pub permission_details: Vec<PermissionSimpleResponse>,
}

impl From<(Role, Vec<PermissionSummary>)> for RoleExpandedResponse {
    fn from((role, permissions): (Role, Vec<PermissionSummary>)) -> Self {
        Self {
            role: role.into(),
            permission_details: permissions.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionResponse {
    pub id: Option<PermissionId>,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

impl From<Permission> for PermissionResponse {
    fn from(permission: Permission) -> Self {
        Self {
            id: permission.id(),
            name: permission.name,
            display_name: permission.display_name,
            description: permission.description,
            category: permission.category,
            created_at: permission.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSimpleResponse {
    pub id: PermissionId,
    pub name: String,
    pub display_name: String,
    pub category: String,
}

impl From<PermissionSummary> for PermissionSimpleResponse {
    fn from(summary: PermissionSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            display_name: summary.display_name,
            category: summary.category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionGroupResponse {
    pub id: Option<PermissionGroupId>,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub order: i32,
    pub permission_count: usize,
    pub permissions: Vec<PermissionId>,
    pub created_at: DateTime<Utc>,
}

impl From<PermissionGroup> for PermissionGroupResponse {
    fn from(group: PermissionGroup) -> Self {
        Self {
            id: group.id(),
            permission_count: group.permission_count(),
            name: group.name,
            display_name: group.display_name,
            description: group.description,
            icon: group.icon,
            order: group.order,
            permissions: group.permissions,
            created_at: group.created_at,
        }
    }
}

/// 统一响应包装
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> BaseResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

impl<T> From<AppResult<T>> for BaseResponse<T> {
    fn from(result: AppResult<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::fail(e.to_string()),
        }
    }
}

/// 分页响应包装
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: PaginationResponse,
    pub error: Option<String>,
}

impl<T> PaginatedResponse<T> {
    pub fn ok(paged: PagedResult<T>) -> Self {
        Self {
            success: true,
            pagination: PaginationResponse::from_paged(&paged),
            data: paged.items,
            error: None,
        }
    }

    pub fn fail(request: &PaginationRequest, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Vec::new(),
            pagination: PaginationResponse::empty(request),
            error: Some(error.into()),
        }
    }
}
