//! Permissions: opaque capability names (e.g. `"posts:write"`) granted to
//! roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use entix_access::{AuditColumns, EntitySchema};
use entix_core::{define_uuid_id, FieldValue, UserId};

define_uuid_id! {
    pub struct PermissionId
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub created_by: Option<UserId>,
    pub updated_by: Option<UserId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionCreate {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermissionUpdate {
    pub name: Option<String>,
}

impl EntitySchema for Permission {
    type Id = PermissionId;
    type Create = PermissionCreate;
    type Update = PermissionUpdate;

    const TABLE: &'static str = "permissions";

    fn columns() -> &'static [&'static str] {
        &[
            "id",
            "name",
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

    fn id(&self) -> PermissionId {
        self.id
    }

    fn field(&self, column: &str) -> FieldValue {
        match column {
            "id" => self.id.into(),
            "name" => self.name.as_str().into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            "created_by" => UserId::to_field(self.created_by),
            "updated_by" => UserId::to_field(self.updated_by),
            _ => FieldValue::Null,
        }
    }

    fn from_create(input: PermissionCreate) -> Self {
        Self {
            id: PermissionId::new(),
            name: input.name,
            created_at: Utc::now(),
            updated_at: None,
            created_by: None,
            updated_by: None,
        }
    }

    fn apply_update(&mut self, input: &PermissionUpdate) {
        if let Some(name) = &input.name {
            self.name = name.clone();
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
