//! 实体与行之间的纯转换
//!
//! 只处理标量列。`to_entity` 读取行上已加载的成员；`to_model` 与
//! `update_model_from_entity` 从不设置关联成员，也不改动已有行的主键。

use tessera_domain_core::Entity;

use super::models::{PermissionGroupModel, PermissionModel, RoleModel, identity_of};
use crate::domain::role::{Permission, PermissionGroup, PermissionGroupId, PermissionId, Role};

pub struct RoleMapper;

impl RoleMapper {
    pub fn to_entity(model: RoleModel) -> Role {
        Role {
            identity: identity_of(model.id),
            name: model.name,
            display_name: model.display_name,
            description: model.description,
            permissions: model.permission_ids.into_iter().map(PermissionId).collect(),
            permission_groups: model
                .permission_group_ids
                .into_iter()
                .map(PermissionGroupId)
                .collect(),
            // 用户数不在本层计算
            user_count: 0,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    pub fn to_model(role: &Role) -> RoleModel {
        RoleModel {
            id: role.id().map(|id| id.0),
            name: role.name.clone(),
            display_name: role.display_name.clone(),
            description: role.description.clone(),
            created_at: role.created_at,
            updated_at: None,
            permission_ids: Vec::new(),
            permission_group_ids: Vec::new(),
        }
    }

    pub fn update_model_from_entity<'a>(
        model: &'a mut RoleModel,
        role: &Role,
    ) -> &'a mut RoleModel {
        model.name.clone_from(&role.name);
        model.display_name.clone_from(&role.display_name);
        model.description.clone_from(&role.description);
        model
    }
}

pub struct PermissionMapper;

impl PermissionMapper {
    pub fn to_entity(model: PermissionModel) -> Permission {
        Permission {
            identity: identity_of(model.id),
            name: model.name,
            display_name: model.display_name,
            description: model.description,
            category: model.category,
            created_at: model.created_at,
        }
    }

    pub fn to_model(permission: &Permission) -> PermissionModel {
        PermissionModel {
            id: permission.id().map(|id| id.0),
            name: permission.name.clone(),
            display_name: permission.display_name.clone(),
            description: permission.description.clone(),
            category: permission.category.clone(),
            created_at: permission.created_at,
        }
    }

    pub fn update_model_from_entity<'a>(
        model: &'a mut PermissionModel,
        permission: &Permission,
    ) -> &'a mut PermissionModel {
        model.name.clone_from(&permission.name);
        model.display_name.clone_from(&permission.display_name);
        model.description.clone_from(&permission.description);
        model.category.clone_from(&permission.category);
        model
    }
}

pub struct PermissionGroupMapper;

impl PermissionGroupMapper {
    pub fn to_entity(model: PermissionGroupModel) -> PermissionGroup {
        PermissionGroup {
            identity: identity_of(model.id),
            name: model.name,
            display_name: model.display_name,
            description: model.description,
            icon: model.icon,
            order: model.order,
            permissions: model.permission_ids.into_iter().map(PermissionId).collect(),
            created_at: model.created_at,
        }
    }

    pub fn to_model(group: &PermissionGroup) -> PermissionGroupModel {
        PermissionGroupModel {
            id: group.id().map(|id| id.0),
            name: group.name.clone(),
            display_name: group.display_name.clone(),
            description: group.description.clone(),
            icon: group.icon.clone(),
            order: group.order,
            created_at: group.created_at,
            permission_ids: Vec::new(),
        }
    }

    pub fn update_model_from_entity<'a>(
        model: &'a mut PermissionGroupModel,
        group: &PermissionGroup,
    ) -> &'a mut PermissionGroupModel {
        model.name.clone_from(&group.name);
        model.display_name.clone_from(&group.display_name);
        model.description.clone_from(&group.description);
        model.icon.clone_from(&group.icon);
        model.order = group.order;
        model
    }
}
