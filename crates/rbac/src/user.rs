//! User accounts.
//!
//! Users intentionally carry no audit columns: the first account of a
//! deployment is created before any acting identity exists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use entix_access::EntitySchema;
use entix_core::{FieldValue, UserId};

/// A user account: the identity behind contexts, audit stamps, and
/// permission checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub is_active: bool,
    /// Unconditional escape hatch: satisfies every permission check.
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub name: String,
    pub surname: String,
    pub email: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
}

impl EntitySchema for User {
    type Id = UserId;
    type Create = UserCreate;
    type Update = UserUpdate;

    const TABLE: &'static str = "users";

    fn columns() -> &'static [&'static str] {
        &[
            "id",
            "name",
            "surname",
            "email",
            "is_active",
            "is_superuser",
            "created_at",
            "updated_at",
        ]
    }

    fn primary_key() -> &'static str {
        "id"
    }

    fn id(&self) -> UserId {
        self.id
    }

    fn field(&self, column: &str) -> FieldValue {
        match column {
            "id" => self.id.into(),
            "name" => self.name.as_str().into(),
            "surname" => self.surname.as_str().into(),
            "email" => self.email.as_str().into(),
            "is_active" => self.is_active.into(),
            "is_superuser" => self.is_superuser.into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            _ => FieldValue::Null,
        }
    }

    fn from_create(input: UserCreate) -> Self {
        Self {
            id: UserId::new(),
            name: input.name,
            surname: input.surname,
            email: input.email.trim().to_lowercase(),
            is_active: input.is_active,
            is_superuser: input.is_superuser,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn apply_update(&mut self, input: &UserUpdate) {
        if let Some(name) = &input.name {
            self.name = name.clone();
        }
        if let Some(surname) = &input.surname {
            self.surname = surname.clone();
        }
        if let Some(email) = &input.email {
            self.email = email.trim().to_lowercase();
        }
        if let Some(is_active) = input.is_active {
            self.is_active = is_active;
        }
        self.updated_at = Some(Utc::now());
    }
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }
}
