//! 表结构与迁移
//!
//! 三张实体表加三张纯关联表，关联表只有两个外键列，双向 ON DELETE CASCADE。

use tessera_adapter_postgres::Migration;

use super::association::Association;

pub const ROLES: &str = "roles";
pub const PERMISSIONS: &str = "permissions";
pub const PERMISSION_GROUPS: &str = "permission_groups";

/// Role ↔ Permission
pub const ROLE_PERMISSIONS: Association = Association {
    table: "role_permissions",
    owner_column: "role_id",
    member_column: "permission_id",
    member_table: PERMISSIONS,
};

/// Role ↔ PermissionGroup
pub const ROLE_PERMISSION_GROUPS: Association = Association {
    table: "role_permission_groups",
    owner_column: "role_id",
    member_column: "permission_group_id",
    member_table: PERMISSION_GROUPS,
};

/// PermissionGroup ↔ Permission
pub const PERMISSION_GROUP_PERMISSIONS: Association = Association {
    table: "permission_group_permissions",
    owner_column: "permission_group_id",
    member_column: "permission_id",
    member_table: PERMISSIONS,
};

const CREATE_ENTITY_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS roles (
    id BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
    name VARCHAR(100) NOT NULL,
    display_name VARCHAR(200) NOT NULL,
    description TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ,
    CONSTRAINT roles_name_key UNIQUE (name)
);

CREATE TABLE IF NOT EXISTS permissions (
    id BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
    name VARCHAR(100) NOT NULL,
    display_name VARCHAR(200) NOT NULL,
    description TEXT,
    category VARCHAR(50) NOT NULL DEFAULT 'general',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT permissions_name_key UNIQUE (name)
);

CREATE TABLE IF NOT EXISTS permission_groups (
    id BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
    name VARCHAR(100) NOT NULL,
    display_name VARCHAR(200) NOT NULL,
    description TEXT,
    icon VARCHAR(50),
    "order" INTEGER NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT permission_groups_name_key UNIQUE (name)
);
"#;

const CREATE_ASSOCIATION_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS role_permissions (
    role_id BIGINT NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
    permission_id BIGINT NOT NULL REFERENCES permissions(id) ON DELETE CASCADE,
    PRIMARY KEY (role_id, permission_id)
);

CREATE TABLE IF NOT EXISTS role_permission_groups (
    role_id BIGINT NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
    permission_group_id BIGINT NOT NULL REFERENCES permission_groups(id) ON DELETE CASCADE,
    PRIMARY KEY (role_id, permission_group_id)
);

CREATE TABLE IF NOT EXISTS permission_group_permissions (
    permission_group_id BIGINT NOT NULL REFERENCES permission_groups(id) ON DELETE CASCADE,
    permission_id BIGINT NOT NULL REFERENCES permissions(id) ON DELETE CASCADE,
    PRIMARY KEY (permission_group_id, permission_id)
);
"#;

// 主键只覆盖 owner 侧；级联删除成员时按 member 列查找
const CREATE_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_role_permissions_permission ON role_permissions (permission_id);
CREATE INDEX IF NOT EXISTS idx_role_permission_groups_group ON role_permission_groups (permission_group_id);
CREATE INDEX IF NOT EXISTS idx_permission_group_permissions_permission ON permission_group_permissions (permission_id);
CREATE INDEX IF NOT EXISTS idx_roles_created_at ON roles (created_at DESC, id DESC);
CREATE INDEX IF NOT EXISTS idx_permissions_category_name ON permissions (category, name);
"#;

/// RBAC schema 的全部迁移，按版本升序
pub fn rbac_migrations() -> Vec<Migration> {
    vec![
        Migration::new(1, "create_rbac_entity_tables", CREATE_ENTITY_TABLES),
        Migration::new(2, "create_rbac_association_tables", CREATE_ASSOCIATION_TABLES),
        Migration::new(3, "create_rbac_indexes", CREATE_INDEXES),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_ordered_and_unique() {
        let migrations = rbac_migrations();
        let versions: Vec<i64> = migrations.iter().map(|m| m.version).collect();
        assert_eq!(versions, vec![1, 2, 3]);
    }

    #[test]
    fn test_every_association_cascades_both_ways() {
        for assoc in [ROLE_PERMISSIONS, ROLE_PERMISSION_GROUPS, PERMISSION_GROUP_PERMISSIONS] {
            let owner_fk = format!("{} BIGINT NOT NULL REFERENCES", assoc.owner_column);
            let member_fk = format!(
                "{} BIGINT NOT NULL REFERENCES {}(id) ON DELETE CASCADE",
                assoc.member_column, assoc.member_table
            );
            let block = CREATE_ASSOCIATION_TABLES
                .split("CREATE TABLE IF NOT EXISTS ")
                .find(|b| b.starts_with(assoc.table))
                .unwrap();
            assert!(block.contains(&owner_fk), "{}", assoc.table);
            assert!(block.contains(&member_fk), "{}", assoc.table);
            assert_eq!(block.matches("ON DELETE CASCADE").count(), 2);
        }
    }
}
