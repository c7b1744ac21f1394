//! `entix-core` — foundation building blocks for the entity-access layer.
//!
//! This crate contains **pure** primitives (no storage concerns):
//! strongly-typed identifiers, the dynamic scalar used by filter and sort
//! clauses, and the shared error taxonomy.

pub mod error;
pub mod id;
pub mod value;

pub use error::{AccessError, ClauseKind, ConfigError, StoreError};
pub use id::UserId;
pub use value::FieldValue;
