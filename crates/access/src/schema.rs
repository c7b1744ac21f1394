//! Per-entity schema declaration consumed by the engine.

use core::fmt::{Debug, Display};
use core::hash::Hash;

use entix_core::{FieldValue, UserId};

/// Names of the audit columns an entity carries.
///
/// Both columns are nullable references to a user identity: the creator is
/// written once on create, the modifier on every update, and only when the
/// operation's context supplies an identity.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AuditColumns {
    pub creator: &'static str,
    pub modifier: &'static str,
}

/// Update input for entities that are never partially updated
/// (e.g. association rows that are only created and deleted).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct NoUpdate;

/// Declaration of a persisted entity.
///
/// Implementations describe the entity's column set and provide the row
/// construction/mutation hooks the engine drives. The declaration is
/// introspected exactly once, when a repository over the entity is built;
/// see [`crate::EntityDescriptor`].
pub trait EntitySchema: Sized + Clone + Send + Sync + 'static {
    /// Primary-key type.
    type Id: Clone + Eq + Hash + Debug + Display + Into<FieldValue> + Send + Sync;

    /// Input for `create`.
    type Create: Send;

    /// Partial input for `update`; unset fields are left untouched.
    type Update: Send;

    const TABLE: &'static str;

    fn columns() -> &'static [&'static str];

    fn primary_key() -> &'static str;

    /// Audit column names, for entities that track creator/modifier.
    fn audit_columns() -> Option<AuditColumns> {
        None
    }

    /// Columns a caller may sort by. Defaults to every column.
    fn sortable_columns() -> &'static [&'static str] {
        Self::columns()
    }

    /// Columns a caller may filter on. Defaults to every column.
    fn filterable_columns() -> &'static [&'static str] {
        Self::columns()
    }

    fn id(&self) -> Self::Id;

    /// Current value of a declared column. Undeclared names yield `Null`;
    /// the engine only asks for members of [`Self::columns`].
    fn field(&self, column: &str) -> FieldValue;

    /// Build a fresh row from create input: generates the primary key and
    /// any construction-time defaults (e.g. creation timestamps).
    fn from_create(input: Self::Create) -> Self;

    /// Apply a partial update in place.
    fn apply_update(&mut self, input: &Self::Update);

    /// Record the creating identity. No-op for entities without audit columns.
    fn stamp_creator(&mut self, _user: UserId) {}

    /// Record the last-modifying identity. No-op for entities without audit
    /// columns.
    fn stamp_modifier(&mut self, _user: UserId) {}
}
