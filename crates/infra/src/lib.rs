//! `entix-infra` — infrastructure adapters for the entity-access layer.
//!
//! Postgres-backed [`entix_access::EntityStore`] implementation plus process
//! telemetry. Core crates stay driver-free; everything `sqlx`/`tokio` lives
//! here.

pub mod postgres;
pub mod telemetry;

pub use postgres::{PgMapped, PgStore};
