//! Roles: named bundles of permissions assigned to users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use entix_access::{AuditColumns, EntitySchema};
use entix_core::{define_uuid_id, FieldValue, UserId};

define_uuid_id! {
    pub struct RoleId
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub created_by: Option<UserId>,
    pub updated_by: Option<UserId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleCreate {
    pub name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleUpdate {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

impl EntitySchema for Role {
    type Id = RoleId;
    type Create = RoleCreate;
    type Update = RoleUpdate;

    const TABLE: &'static str = "roles";

    fn columns() -> &'static [&'static str] {
        &[
            "id",
            "name",
            "is_active",
            "created_at",
            "updated_at",
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

    fn id(&self) -> RoleId {
        self.id
    }

    fn field(&self, column: &str) -> FieldValue {
        match column {
            "id" => self.id.into(),
            "name" => self.name.as_str().into(),
            "is_active" => self.is_active.into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            "created_by" => UserId::to_field(self.created_by),
            "updated_by" => UserId::to_field(self.updated_by),
            _ => FieldValue::Null,
        }
    }

    fn from_create(input: RoleCreate) -> Self {
        Self {
            id: RoleId::new(),
            name: input.name,
            is_active: input.is_active,
            created_at: Utc::now(),
            updated_at: None,
            created_by: None,
            updated_by: None,
        }
    }

    fn apply_update(&mut self, input: &RoleUpdate) {
        if let Some(name) = &input.name {
            self.name = name.clone();
        }
        if let Some(is_active) = input.is_active {
            self.is_active = is_active;
        }
        self.updated_at = Some(Utc::now());
    }

    fn stamp_creator(&mut self, user: UserId) {
        self.created_by = Some(user);
    }

    fn stamp_modifier(&mut self, user: UserId) {
        self.updated_by = Some(user);
    }
}
