//! 单元测试用的内存仓储
//!
//! 行为与数据库实现保持一致：名称唯一、成员只保留已存在的权限、删除时级联清理关联。

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use tessera_domain_core::{Entity, Identity};
use tessera_errors::{AppError, AppResult};

use crate::domain::role::{
    Permission, PermissionGroup, PermissionGroupId, PermissionGroupRepository, PermissionId,
    PermissionRepository, PermissionSummary, Role, RoleId, RoleRepository,
};
use crate::domain::unit_of_work::{UnitOfWork, UnitOfWorkFactory};
use crate::infrastructure::persistence::partition_by_category;

#[derive(Default)]
struct State {
    roles: BTreeMap<i64, Role>,
    permissions: BTreeMap<i64, Permission>,
    groups: BTreeMap<i64, PermissionGroup>,
    last_id: i64,
}

impl State {
    fn next_id(&mut self, explicit: Option<i64>) -> i64 {
        match explicit {
            Some(id) => {
                self.last_id = self.last_id.max(id);
                id
            }
            None => {
                self.last_id += 1;
                self.last_id
            }
        }
    }

    /// 去重、排序并丢弃不存在的权限
    fn existing_permissions(&self, ids: &[PermissionId]) -> Vec<PermissionId> {
        ids.iter()
            .filter(|id| self.permissions.contains_key(&id.0))
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn existing_groups(&self, ids: &[PermissionGroupId]) -> Vec<PermissionGroupId> {
        ids.iter()
            .filter(|id| self.groups.contains_key(&id.0))
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn name_taken<'a, I>(mut names: I, id: Option<i64>, name: &str) -> bool
    where
        I: Iterator<Item = (&'a i64, &'a str)>,
    {
        names.any(|(other, other_name)| Some(*other) != id && other_name == name)
    }
}

/// 三个内存仓储共享的存储
#[derive(Default)]
pub struct InMemoryDb {
    state: Mutex<State>,
}

impl InMemoryDb {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

pub struct InMemoryRoleRepository(Arc<InMemoryDb>);
pub struct InMemoryPermissionRepository(Arc<InMemoryDb>);
pub struct InMemoryPermissionGroupRepository(Arc<InMemoryDb>);

impl InMemoryRoleRepository {
    pub fn new(db: Arc<InMemoryDb>) -> Self {
        Self(db)
    }
}

impl InMemoryPermissionRepository {
    pub fn new(db: Arc<InMemoryDb>) -> Self {
        Self(db)
    }
}

impl InMemoryPermissionGroupRepository {
    pub fn new(db: Arc<InMemoryDb>) -> Self {
        Self(db)
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn get_by_id(&self, id: &RoleId) -> AppResult<Option<Role>> {
        Ok(self.0.state.lock().unwrap().roles.get(&id.0).cloned())
    }

    async fn save(&self, role: &Role) -> AppResult<Role> {
        let mut state = self.0.state.lock().unwrap();
        let explicit = role.id().map(|id| id.0);
        let names = state.roles.iter().map(|(id, r)| (id, r.name.as_str()));
        if State::name_taken(names, explicit, &role.name) {
            return Err(AppError::conflict("Unique constraint violation: roles_name_key"));
        }

        let id = state.next_id(explicit);
        let existing = state.roles.get(&id).cloned();
        let mut saved = role.clone();
        saved.identity = Identity::Existing(RoleId(id));
        saved.user_count = 0;
        saved.permissions = state.existing_permissions(&role.permissions);
        saved.permission_groups = state.existing_groups(&role.permission_groups);
        match existing {
            Some(old) => {
                saved.created_at = old.created_at;
                saved.updated_at = Some(Utc::now());
            }
            None => saved.updated_at = None,
        }
        state.roles.insert(id, saved.clone());
        Ok(saved)
    }

    async fn delete(&self, id: &RoleId) -> AppResult<()> {
        self.0.state.lock().unwrap().roles.remove(&id.0);
        Ok(())
    }

    async fn list(&self) -> AppResult<Vec<Role>> {
        let mut roles: Vec<Role> = self.0.state.lock().unwrap().roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn list_paginated(&self, page: u32, page_size: u32) -> AppResult<(Vec<Role>, u64)> {
        let mut roles: Vec<Role> = self.0.state.lock().unwrap().roles.values().cloned().collect();
        roles.sort_by(|a, b| (b.created_at, b.id()).cmp(&(a.created_at, a.id())));
        let total = roles.len() as u64;
        let skip = (page.max(1) as usize - 1) * page_size as usize;
        let items = roles.into_iter().skip(skip).take(page_size as usize).collect();
        Ok((items, total))
    }

    async fn count(&self) -> AppResult<u64> {
        Ok(self.0.state.lock().unwrap().roles.len() as u64)
    }

    async fn add_permissions(
        &self,
        id: &RoleId,
        permission_ids: &[PermissionId],
    ) -> AppResult<Role> {
        let mut state = self.0.state.lock().unwrap();
        let mut role = state
            .roles
            .get(&id.0)
            .cloned()
            .ok_or_else(|| AppError::entity_not_found("Role", id))?;
        let mut merged = role.permissions.clone();
        merged.extend_from_slice(permission_ids);
        role.permissions = state.existing_permissions(&merged);
        state.roles.insert(id.0, role.clone());
        Ok(role)
    }

    async fn remove_permissions(
        &self,
        id: &RoleId,
        permission_ids: &[PermissionId],
    ) -> AppResult<Role> {
        let mut state = self.0.state.lock().unwrap();
        let role = state
            .roles
            .get_mut(&id.0)
            .ok_or_else(|| AppError::entity_not_found("Role", id))?;
        role.permissions.retain(|p| !permission_ids.contains(p));
        Ok(role.clone())
    }

    async fn count_permissions(&self, id: &RoleId) -> AppResult<u64> {
        let state = self.0.state.lock().unwrap();
        Ok(state
            .roles
            .get(&id.0)
            .map_or(0, |r| r.permissions.len() as u64))
    }

    async fn get_by_id_with_permissions(
        &self,
        id: &RoleId,
    ) -> AppResult<Option<(Role, Vec<PermissionSummary>)>> {
        let state = self.0.state.lock().unwrap();
        let Some(role) = state.roles.get(&id.0).cloned() else {
            return Ok(None);
        };
        let mut summaries: Vec<PermissionSummary> = role
            .permissions
            .iter()
            .filter_map(|p| state.permissions.get(&p.0))
            .map(|p| PermissionSummary {
                id: p.id().unwrap_or(PermissionId(0)),
                name: p.name.clone(),
                display_name: p.display_name.clone(),
                category: p.category.clone(),
            })
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Some((role, summaries)))
    }
}

#[async_trait]
impl PermissionRepository for InMemoryPermissionRepository {
    async fn get_by_id(&self, id: &PermissionId) -> AppResult<Option<Permission>> {
        Ok(self.0.state.lock().unwrap().permissions.get(&id.0).cloned())
    }

    async fn save(&self, permission: &Permission) -> AppResult<Permission> {
        let mut state = self.0.state.lock().unwrap();
        let explicit = permission.id().map(|id| id.0);
        let names = state.permissions.iter().map(|(id, p)| (id, p.name.as_str()));
        if State::name_taken(names, explicit, &permission.name) {
            return Err(AppError::conflict(
                "Unique constraint violation: permissions_name_key",
            ));
        }

        let id = state.next_id(explicit);
        let mut saved = permission.clone();
        saved.identity = Identity::Existing(PermissionId(id));
        if let Some(old) = state.permissions.get(&id) {
            saved.created_at = old.created_at;
        }
        state.permissions.insert(id, saved.clone());
        Ok(saved)
    }

    async fn delete(&self, id: &PermissionId) -> AppResult<()> {
        let mut state = self.0.state.lock().unwrap();
        if state.permissions.remove(&id.0).is_some() {
            for role in state.roles.values_mut() {
                role.permissions.retain(|p| p != id);
            }
            for group in state.groups.values_mut() {
                group.permissions.retain(|p| p != id);
            }
        }
        Ok(())
    }

    async fn list(&self) -> AppResult<Vec<Permission>> {
        let mut permissions: Vec<Permission> = self
            .0
            .state
            .lock()
            .unwrap()
            .permissions
            .values()
            .cloned()
            .collect();
        permissions.sort_by(|a, b| (&a.category, &a.name).cmp(&(&b.category, &b.name)));
        Ok(permissions)
    }

    async fn count(&self) -> AppResult<u64> {
        Ok(self.0.state.lock().unwrap().permissions.len() as u64)
    }

    async fn group_by_category(&self) -> AppResult<IndexMap<String, Vec<Permission>>> {
        Ok(partition_by_category(self.list().await?))
    }
}

#[async_trait]
impl PermissionGroupRepository for InMemoryPermissionGroupRepository {
    async fn get_by_id(&self, id: &PermissionGroupId) -> AppResult<Option<PermissionGroup>> {
        Ok(self.0.state.lock().unwrap().groups.get(&id.0).cloned())
    }

    async fn save(&self, group: &PermissionGroup) -> AppResult<PermissionGroup> {
        let mut state = self.0.state.lock().unwrap();
        let explicit = group.id().map(|id| id.0);
        let names = state.groups.iter().map(|(id, g)| (id, g.name.as_str()));
        if State::name_taken(names, explicit, &group.name) {
            return Err(AppError::conflict(
                "Unique constraint violation: permission_groups_name_key",
            ));
        }

        let id = state.next_id(explicit);
        let mut saved = group.clone();
        saved.identity = Identity::Existing(PermissionGroupId(id));
        saved.permissions = state.existing_permissions(&group.permissions);
        if let Some(old) = state.groups.get(&id) {
            saved.created_at = old.created_at;
        }
        state.groups.insert(id, saved.clone());
        Ok(saved)
    }

    async fn delete(&self, id: &PermissionGroupId) -> AppResult<()> {
        let mut state = self.0.state.lock().unwrap();
        if state.groups.remove(&id.0).is_some() {
            for role in state.roles.values_mut() {
                role.permission_groups.retain(|g| g != id);
            }
        }
        Ok(())
    }

    async fn list(&self) -> AppResult<Vec<PermissionGroup>> {
        let mut groups: Vec<PermissionGroup> =
            self.0.state.lock().unwrap().groups.values().cloned().collect();
        groups.sort_by(|a, b| (a.order, &a.name).cmp(&(b.order, &b.name)));
        Ok(groups)
    }

    async fn count(&self) -> AppResult<u64> {
        Ok(self.0.state.lock().unwrap().groups.len() as u64)
    }

    async fn add_permissions(
        &self,
        id: &PermissionGroupId,
        permission_ids: &[PermissionId],
    ) -> AppResult<PermissionGroup> {
        let mut state = self.0.state.lock().unwrap();
        let mut group = state
            .groups
            .get(&id.0)
            .cloned()
            .ok_or_else(|| AppError::entity_not_found("PermissionGroup", id))?;
        let mut merged = group.permissions.clone();
        merged.extend_from_slice(permission_ids);
        group.permissions = state.existing_permissions(&merged);
        state.groups.insert(id.0, group.clone());
        Ok(group)
    }

    async fn remove_permissions(
        &self,
        id: &PermissionGroupId,
        permission_ids: &[PermissionId],
    ) -> AppResult<PermissionGroup> {
        let mut state = self.0.state.lock().unwrap();
        let group = state
            .groups
            .get_mut(&id.0)
            .ok_or_else(|| AppError::entity_not_found("PermissionGroup", id))?;
        group.permissions.retain(|p| !permission_ids.contains(p));
        Ok(group.clone())
    }

    async fn count_permissions(&self, id: &PermissionGroupId) -> AppResult<u64> {
        let state = self.0.state.lock().unwrap();
        Ok(state
            .groups
            .get(&id.0)
            .map_or(0, |g| g.permissions.len() as u64))
    }
}

/// Unit of Work 调用记录
#[derive(Default)]
pub struct UowLog {
    begun: AtomicUsize,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
    fail_begin: AtomicBool,
}

impl UowLog {
    pub fn begun(&self) -> usize {
        self.begun.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }
}

/// 内存 Unit of Work 工厂，不提供真正的回滚，只记录调用
pub struct InMemoryUnitOfWorkFactory {
    db: Arc<InMemoryDb>,
    log: Arc<UowLog>,
}

impl InMemoryUnitOfWorkFactory {
    pub fn new() -> Self {
        Self {
            db: InMemoryDb::new(),
            log: Arc::new(UowLog::default()),
        }
    }

    pub fn log(&self) -> Arc<UowLog> {
        self.log.clone()
    }

    /// 之后的 begin 全部失败
    pub fn fail_begin(&self) {
        self.log.fail_begin.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl UnitOfWorkFactory for InMemoryUnitOfWorkFactory {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        if self.log.fail_begin.load(Ordering::SeqCst) {
            return Err(AppError::unavailable("Pool timed out"));
        }
        self.log.begun.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemoryUnitOfWork {
            roles: InMemoryRoleRepository::new(self.db.clone()),
            permissions: InMemoryPermissionRepository::new(self.db.clone()),
            groups: InMemoryPermissionGroupRepository::new(self.db.clone()),
            log: self.log.clone(),
        }))
    }
}

struct InMemoryUnitOfWork {
    roles: InMemoryRoleRepository,
    permissions: InMemoryPermissionRepository,
    groups: InMemoryPermissionGroupRepository,
    log: Arc<UowLog>,
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    fn roles(&self) -> &dyn RoleRepository {
        &self.roles
    }

    fn permissions(&self) -> &dyn PermissionRepository {
        &self.permissions
    }

    fn permission_groups(&self) -> &dyn PermissionGroupRepository {
        &self.groups
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.log.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.log.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
