//! Error taxonomy for the entity-access layer.
//!
//! Three families, by failure time and owner:
//! - [`ConfigError`]: construction-time, fatal, never retried.
//! - [`AccessError`]: per-operation failures surfaced to callers.
//! - [`StoreError`]: failures raised by a storage session implementation.

use thiserror::Error;

/// Which clause of a list query a field belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ClauseKind {
    Filter,
    Sort,
}

impl core::fmt::Display for ClauseKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ClauseKind::Filter => f.write_str("filter"),
            ClauseKind::Sort => f.write_str("sort"),
        }
    }
}

/// Construction-time configuration error.
///
/// Raised while building a repository, before any operation is callable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The entity declares audit columns but the chosen context type can
    /// never supply an acting user.
    #[error("entity [{table}] declares audit columns but the context type carries no acting user")]
    AuditRequiresUser { table: &'static str },

    /// A declared column reference points outside the entity's column set.
    #[error("entity [{table}] {what} column '{column}' is not declared")]
    UndeclaredColumn {
        table: &'static str,
        what: &'static str,
        column: String,
    },

    /// Page-size bounds are inconsistent (zero, or default above maximum).
    #[error("invalid page bounds: default={default}, max={max}")]
    InvalidPageBounds { default: u32, max: u32 },
}

/// Failure raised by a storage session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Insert with a primary key that is already present.
    #[error("duplicate primary key")]
    DuplicateKey,

    /// Update or delete against a row that is not present.
    #[error("row not found")]
    Missing,

    /// A lookup expected at most one row but matched several.
    #[error("lookup matched more than one row")]
    NonUnique,

    /// Driver- or backend-level failure.
    #[error("storage backend: {0}")]
    Backend(String),
}

/// Per-operation failure surfaced by the entity-access engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// A sort or filter field is outside the entity's allow-list.
    #[error("invalid query: unknown {kind} field '{field}'")]
    InvalidQuery { kind: ClauseKind, field: String },

    /// The requested primary key does not exist.
    #[error("entity [{table}] with id={id} does not exist")]
    EntityNotFound { table: &'static str, id: String },

    /// A conflicting row already matched the uniqueness filters.
    #[error("entity [{table}] already exists")]
    DuplicateEntity { table: &'static str },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AccessError {
    pub fn invalid_query(kind: ClauseKind, field: impl Into<String>) -> Self {
        AccessError::InvalidQuery {
            kind,
            field: field.into(),
        }
    }

    pub fn entity_not_found(table: &'static str, id: impl core::fmt::Display) -> Self {
        AccessError::EntityNotFound {
            table,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AccessError::EntityNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_field() {
        let err = AccessError::invalid_query(ClauseKind::Filter, "nonexistent_field");
        assert_eq!(
            err.to_string(),
            "invalid query: unknown filter field 'nonexistent_field'"
        );
    }

    #[test]
    fn not_found_names_table_and_id() {
        let err = AccessError::entity_not_found("widgets", 999);
        assert_eq!(err.to_string(), "entity [widgets] with id=999 does not exist");
        assert!(err.is_not_found());
    }

    #[test]
    fn store_errors_wrap_transparently() {
        let err: AccessError = StoreError::NonUnique.into();
        assert_eq!(err.to_string(), "lookup matched more than one row");
    }
}
