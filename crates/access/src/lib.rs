//! `entix-access` — generic entity-access engine.
//!
//! One parameterized [`Repository`] provides create/read/update/delete/list
//! over any persisted entity declared through [`EntitySchema`], while:
//!
//! - the context types ([`UserContext`], [`NoUserContext`],
//!   [`MaybeUserContext`]) make "does this operation carry an acting user"
//!   part of the signature rather than a runtime value to inspect;
//! - audit columns (creator / last modifier) are stamped exactly when the
//!   entity declares them **and** the context supplies an identity — the
//!   combination is cross-checked once, at repository construction;
//! - untrusted sort/filter input is validated against per-entity allow-lists
//!   and turned into deterministic, stably-paginated queries.
//!
//! Storage is reached through the [`EntityStore`] session abstraction;
//! [`MemoryStore`] is the in-process implementation used by tests and tools.

pub mod context;
pub mod descriptor;
pub mod engine;
pub mod memory;
pub mod query;
pub mod schema;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;


pub use context::{AccessContext, MaybeUserContext, NoUserContext, UserContext};
pub use descriptor::EntityDescriptor;
pub use engine::{Repository, RepositoryConfig};
pub use memory::MemoryStore;
pub use query::{
    parse_sort_spec, Direction, ListQuery, QueryPlanner, SelectQuery, SortKey, SortParseError,
};
pub use schema::{AuditColumns, EntitySchema, NoUpdate};
pub use store::EntityStore;
