//! Entity descriptor: schema metadata computed once per repository.

use std::collections::BTreeSet;

use entix_core::ConfigError;

use crate::schema::{AuditColumns, EntitySchema};

/// Validated, immutable view of an entity's declared schema.
///
/// Computed at repository construction and shared read-only thereafter
/// (including across threads). Construction is where declaration mistakes
/// surface: a primary key, audit column, or allow-list entry naming an
/// undeclared column is a [`ConfigError`], raised before any operation on
/// the entity is callable.
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    table: &'static str,
    columns: BTreeSet<&'static str>,
    primary_key: &'static str,
    audit: Option<AuditColumns>,
    sortable: BTreeSet<&'static str>,
    filterable: BTreeSet<&'static str>,
}

impl EntityDescriptor {
    /// Introspect an entity declaration.
    pub fn of<E: EntitySchema>() -> Result<Self, ConfigError> {
        let table = E::TABLE;
        let columns: BTreeSet<&'static str> = E::columns().iter().copied().collect();

        let check = |what: &'static str, column: &'static str| -> Result<(), ConfigError> {
            if columns.contains(column) {
                Ok(())
            } else {
                Err(ConfigError::UndeclaredColumn {
                    table,
                    what,
                    column: column.to_string(),
                })
            }
        };

        check("primary key", E::primary_key())?;

        let audit = E::audit_columns();
        if let Some(audit) = audit {
            check("creator audit", audit.creator)?;
            check("modifier audit", audit.modifier)?;
        }

        let sortable: BTreeSet<&'static str> = E::sortable_columns().iter().copied().collect();
        for column in &sortable {
            check("sortable", *column)?;
        }

        let filterable: BTreeSet<&'static str> = E::filterable_columns().iter().copied().collect();
        for column in &filterable {
            check("filterable", *column)?;
        }

        Ok(Self {
            table,
            columns,
            primary_key: E::primary_key(),
            audit,
            sortable,
            filterable,
        })
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().copied()
    }

    pub fn primary_key(&self) -> &'static str {
        self.primary_key
    }

    pub fn audit(&self) -> Option<AuditColumns> {
        self.audit
    }

    pub fn has_audit(&self) -> bool {
        self.audit.is_some()
    }

    pub fn is_sortable(&self, column: &str) -> bool {
        self.sortable.contains(column)
    }

    pub fn is_filterable(&self, column: &str) -> bool {
        self.filterable.contains(column)
    }
}

#[cfg(test)]
mod tests {
    use entix_core::FieldValue;

    use super::*;

    #[derive(Clone)]
    struct Misdeclared;

    impl EntitySchema for Misdeclared {
        type Id = entix_core::UserId;
        type Create = ();
        type Update = ();

        const TABLE: &'static str = "misdeclared";

        fn columns() -> &'static [&'static str] {
            &["id", "name"]
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

        fn id(&self) -> Self::Id {
            entix_core::UserId::new()
        }

        fn field(&self, _column: &str) -> FieldValue {
            FieldValue::Null
        }

        fn from_create(_input: ()) -> Self {
            Misdeclared
        }

        fn apply_update(&mut self, _input: &()) {}
    }

    #[test]
    fn audit_columns_must_be_declared() {
        let err = EntityDescriptor::of::<Misdeclared>().unwrap_err();
        assert_eq!(
            err,
            ConfigError::UndeclaredColumn {
                table: "misdeclared",
                what: "creator audit",
                column: "created_by".to_string(),
            }
        );
    }

    #[test]
    fn descriptor_reports_allow_lists() {
        let descriptor = EntityDescriptor::of::<crate::testing::Widget>().unwrap();
        assert_eq!(descriptor.table(), "widgets");
        assert_eq!(descriptor.primary_key(), "id");
        assert!(!descriptor.has_audit());
        assert!(descriptor.is_filterable("name"));
        assert!(!descriptor.is_filterable("nonexistent_field"));
    }
}
