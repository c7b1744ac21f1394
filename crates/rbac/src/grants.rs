//! Association rows of the permission graph: user↔role and role↔permission.
//!
//! Both are create/delete-only entities; the repository layer still tracks
//! who created them via their audit columns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use entix_access::{AuditColumns, EntitySchema, NoUpdate};
use entix_core::{define_uuid_id, FieldValue, UserId};

use crate::permission::PermissionId;
use crate::role::RoleId;

define_uuid_id! {
    pub struct UserRoleId
}

/// One user's assignment to one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRole {
    pub id: UserRoleId,
    pub user_id: UserId,
    pub role_id: RoleId,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
    pub updated_by: Option<UserId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRoleCreate {
    pub user_id: UserId,
    pub role_id: RoleId,
}

impl EntitySchema for UserRole {
    type Id = UserRoleId;
    type Create = UserRoleCreate;
    type Update = NoUpdate;

    const TABLE: &'static str = "users_roles";

    fn columns() -> &'static [&'static str] {
        &[
            "id",
            "user_id",
            "role_id",
            "created_at",
            "created_by",
            "updated_by",
        ]
    }

    fn primary_key() -> &'static str {
        "id"
    }

    fn audit_columns() -> Option<AuditColumns> {
        Some(AuditColumns {
            creator: "created_by",
            modifier: "updated_by",
        })
    }

    fn id(&self) -> UserRoleId {
        self.id
    }

    fn field(&self, column: &str) -> FieldValue {
        match column {
            "id" => self.id.into(),
            "user_id" => self.user_id.into(),
            "role_id" => self.role_id.into(),
            "created_at" => self.created_at.into(),
            "created_by" => UserId::to_field(self.created_by),
            "updated_by" => UserId::to_field(self.updated_by),
            _ => FieldValue::Null,
        }
    }

    fn from_create(input: UserRoleCreate) -> Self {
        Self {
            id: UserRoleId::new(),
            user_id: input.user_id,
            role_id: input.role_id,
            created_at: Utc::now(),
            created_by: None,
            updated_by: None,
        }
    }

    fn apply_update(&mut self, _input: &NoUpdate) {}

    fn stamp_creator(&mut self, user: UserId) {
        self.created_by = Some(user);
    }

    fn stamp_modifier(&mut self, user: UserId) {
        self.updated_by = Some(user);
    }
}

define_uuid_id! {
    pub struct RolePermissionId
}

/// One role's grant of one permission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolePermission {
    pub id: RolePermissionId,
    pub role_id: RoleId,
    pub permission_id: PermissionId,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
    pub updated_by: Option<UserId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolePermissionCreate {
    pub role_id: RoleId,
    pub permission_id: PermissionId,
}

impl EntitySchema for RolePermission {
    type Id = RolePermissionId;
    type Create = RolePermissionCreate;
    type Update = NoUpdate;

    const TABLE: &'static str = "roles_permissions";

    fn columns() -> &'static [&'static str] {
        &[
            "id",
            "role_id",
            "permission_id",
            "created_at",
            "created_by",
            "updated_by",
        ]
    }

    fn primary_key() -> &'static str {
        "id"
    }

    fn audit_columns() -> Option<AuditColumns> {
        Some(AuditColumns {
            creator: "created_by",
            modifier: "updated_by",
        })
    }

    fn id(&self) -> RolePermissionId {
        self.id
    }

    fn field(&self, column: &str) -> FieldValue {
        match column {
            "id" => self.id.into(),
            "role_id" => self.role_id.into(),
            "permission_id" => self.permission_id.into(),
            "created_at" => self.created_at.into(),
            "created_by" => UserId::to_field(self.created_by),
            "updated_by" => UserId::to_field(self.updated_by),
            _ => FieldValue::Null,
        }
    }

    fn from_create(input: RolePermissionCreate) -> Self {
        Self {
            id: RolePermissionId::new(),
            role_id: input.role_id,
            permission_id: input.permission_id,
            created_at: Utc::now(),
            created_by: None,
            updated_by: None,
        }
    }

    fn apply_update(&mut self, _input: &NoUpdate) {}

    fn stamp_creator(&mut self, user: UserId) {
        self.created_by = Some(user);
    }

    fn stamp_modifier(&mut self, user: UserId) {
        self.updated_by = Some(user);
    }
}
