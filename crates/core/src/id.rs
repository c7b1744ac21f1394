//! Strongly-typed identifiers.
//!
//! Identifiers are UUIDv7 newtypes: time-ordered, so an ascending sort on a
//! primary key is also a creation-order sort. Prefer passing ids explicitly
//! in tests for determinism.

use uuid::Uuid;

use crate::value::FieldValue;

/// Declare a UUIDv7-backed identifier newtype.
///
/// Generates construction, conversion, parsing, and `FieldValue` plumbing so
/// the identifier can be used directly as a primary-key or filter value.
#[macro_export]
macro_rules! define_uuid_id {
    ($(#[$meta:meta])* $vis:vis struct $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        $vis struct $name(uuid::Uuid);

        impl $name {
            /// Create a new identifier (UUIDv7, time-ordered).
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7())
            }

            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(value: uuid::Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$name> for uuid::Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl From<$name> for $crate::FieldValue {
            fn from(value: $name) -> Self {
                $crate::FieldValue::Uuid(value.0)
            }
        }

        impl core::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(uuid::Uuid::from_str(s)?))
            }
        }
    };
}

define_uuid_id! {
    /// Identifier of an acting user (the identity stamped into audit columns).
    pub struct UserId
}

impl UserId {
    /// Convenience for stamping an optional identity into a nullable column.
    pub fn to_field(id: Option<UserId>) -> FieldValue {
        match id {
            Some(user) => FieldValue::Uuid(user.0),
            None => FieldValue::Null,
        }
    }
}
