//! Storage-session abstraction the engine is composed over.

use entix_core::{FieldValue, StoreError};

use crate::query::SelectQuery;
use crate::schema::EntitySchema;

/// One entity type's persistence operations, as seen by the engine.
///
/// Implementations are sessions over a relational (or relational-shaped)
/// store: [`crate::MemoryStore`] in process, a Postgres pool in
/// `entix-infra`. Column names in `clauses` and [`SelectQuery`] never come
/// from raw client input; the engine validates them against the entity's
/// allow-lists first.
///
/// `select_page` returns count and page from a single snapshot — one lock
/// acquisition or one transaction — so a concurrent writer cannot make the
/// pair disagree.
pub trait EntityStore<E: EntitySchema>: Send + Sync {
    /// Direct primary-key lookup.
    fn get(&self, id: &E::Id) -> Result<Option<E>, StoreError>;

    /// Persist a new row; the primary key must not be present yet.
    fn insert(&self, row: E) -> Result<E, StoreError>;

    /// Persist the new state of an existing row.
    fn update(&self, row: E) -> Result<E, StoreError>;

    /// Remove a row, returning the pre-deletion snapshot if it existed.
    fn remove(&self, id: &E::Id) -> Result<Option<E>, StoreError>;

    /// At most one row matching all clauses; `NonUnique` if several do.
    fn find_one(&self, clauses: &[(String, FieldValue)]) -> Result<Option<E>, StoreError>;

    /// Every row matching all clauses, in ascending primary-key order.
    fn find_many(&self, clauses: &[(String, FieldValue)]) -> Result<Vec<E>, StoreError>;

    /// Total count of rows matching the query's clauses (ignoring the page
    /// window), plus the requested page, from one snapshot.
    fn select_page(&self, query: &SelectQuery) -> Result<(u64, Vec<E>), StoreError>;
}
