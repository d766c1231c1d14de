//! 权限查询处理器

use std::sync::Arc;

use indexmap::IndexMap;
use tessera_errors::{AppError, AppResult};

use crate::domain::role::{Permission, PermissionId, PermissionRepository};

pub struct PermissionQueryHandler<R: PermissionRepository + ?Sized> {
    permission_repo: Arc<R>,
}

impl<R: PermissionRepository + ?Sized> PermissionQueryHandler<R> {
    pub fn new(permission_repo: Arc<R>) -> Self {
        Self { permission_repo }
    }

    pub async fn handle_get(&self, id: PermissionId) -> AppResult<Permission> {
        self.permission_repo
            .get_by_id(&id)
            .await?
            .ok_or_else(|| AppError::entity_not_found("Permission", id))
    }

    pub async fn handle_list(&self) -> AppResult<Vec<Permission>> {
        self.permission_repo.list().await
    }

    /// 按分类分组
    pub async fn handle_grouped(&self) -> AppResult<IndexMap<String, Vec<Permission>>> {
        self.permission_repo.group_by_category().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryDb, InMemoryPermissionRepository};

    #[tokio::test]
    async fn test_handle_grouped() {
        let repo = Arc::new(InMemoryPermissionRepository::new(InMemoryDb::new()));
        for (name, category) in [
            ("users.write", "users"),
            ("tickets.read", "tickets"),
            ("users.read", "users"),
        ] {
            repo.save(&Permission::new(name, name).unwrap().with_category(category))
                .await
                .unwrap();
        }
        let handler = PermissionQueryHandler::new(repo);

        let grouped = handler.handle_grouped().await.unwrap();
        let categories: Vec<&str> = grouped.keys().map(String::as_str).collect();
        assert_eq!(categories, vec!["tickets", "users"]);
        let users: Vec<&str> = grouped["users"].iter().map(|p| p.name.as_str()).collect();
        assert_eq!(users, vec!["users.read", "users.write"]);

        assert_eq!(handler.handle_list().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_handle_get_not_found() {
        let repo = Arc::new(InMemoryPermissionRepository::new(InMemoryDb::new()));
        let handler = PermissionQueryHandler::new(repo);
        assert!(handler.handle_get(PermissionId(3)).await.unwrap_err().is_not_found());
    }
}
