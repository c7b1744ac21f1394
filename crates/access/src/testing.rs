//! Test entities shared across the crate's test modules.

use chrono::{DateTime, Utc};

use entix_core::{define_uuid_id, FieldValue, UserId};

use crate::schema::{AuditColumns, EntitySchema};

define_uuid_id! {
    pub struct WidgetId
}

/// Entity without audit columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    pub id: WidgetId,
    pub name: String,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct WidgetCreate {
    pub name: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Default)]
pub struct WidgetUpdate {
    pub name: Option<String>,
    pub quantity: Option<i64>,
}

impl EntitySchema for Widget {
    type Id = WidgetId;
    type Create = WidgetCreate;
    type Update = WidgetUpdate;

    const TABLE: &'static str = "widgets";

    fn columns() -> &'static [&'static str] {
        &["id", "name", "quantity", "created_at"]
    }

    fn primary_key() -> &'static str {
        "id"
    }

    fn id(&self) -> WidgetId {
        self.id
    }

    fn field(&self, column: &str) -> FieldValue {
        match column {
            "id" => self.id.into(),
            "name" => self.name.as_str().into(),
            "quantity" => self.quantity.into(),
            "created_at" => self.created_at.into(),
            _ => FieldValue::Null,
        }
    }

    fn from_create(input: WidgetCreate) -> Self {
        Self {
            id: WidgetId::new(),
            name: input.name,
            quantity: input.quantity,
            created_at: Utc::now(),
        }
    }

    fn apply_update(&mut self, input: &WidgetUpdate) {
        if let Some(name) = &input.name {
            self.name = name.clone();
        }
        if let Some(quantity) = input.quantity {
            self.quantity = quantity;
        }
    }
}

pub fn widget(name: &str, quantity: i64) -> Widget {
    Widget::from_create(WidgetCreate {
        name: name.to_string(),
        quantity,
    })
}

define_uuid_id! {
    pub struct OrderId
}

/// Entity with creator/modifier audit columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub reference: String,
    pub status: String,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub created_by: Option<UserId>,
    pub updated_by: Option<UserId>,
}

#[derive(Debug, Clone)]
pub struct OrderCreate {
    pub reference: String,
    pub status: String,
    pub total_cents: i64,
}

#[derive(Debug, Clone, Default)]
pub struct OrderUpdate {
    pub status: Option<String>,
    pub total_cents: Option<i64>,
}

impl EntitySchema for Order {
    type Id = OrderId;
    type Create = OrderCreate;
    type Update = OrderUpdate;

    const TABLE: &'static str = "orders";

    fn columns() -> &'static [&'static str] {
        &[
            "id",
            "reference",
            "status",
            "total_cents",
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

    fn sortable_columns() -> &'static [&'static str] {
        &["id", "reference", "status", "total_cents", "created_at"]
    }

    fn id(&self) -> OrderId {
        self.id
    }

    fn field(&self, column: &str) -> FieldValue {
        match column {
            "id" => self.id.into(),
            "reference" => self.reference.as_str().into(),
            "status" => self.status.as_str().into(),
            "total_cents" => self.total_cents.into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            "created_by" => UserId::to_field(self.created_by),
            "updated_by" => UserId::to_field(self.updated_by),
            _ => FieldValue::Null,
        }
    }

    fn from_create(input: OrderCreate) -> Self {
        Self {
            id: OrderId::new(),
            reference: input.reference,
            status: input.status,
            total_cents: input.total_cents,
            created_at: Utc::now(),
            updated_at: None,
            created_by: None,
            updated_by: None,
        }
    }

    fn apply_update(&mut self, input: &OrderUpdate) {
        if let Some(status) = &input.status {
            self.status = status.clone();
        }
        if let Some(total_cents) = input.total_cents {
            self.total_cents = total_cents;
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

pub fn order_create(reference: &str, status: &str, total_cents: i64) -> OrderCreate {
    OrderCreate {
        reference: reference.to_string(),
        status: status.to_string(),
        total_cents,
    }
}
