//! `entix-rbac` — persisted role/permission graph and its resolver.
//!
//! Five entities declared through [`entix_access::EntitySchema`] form the
//! graph: [`User`], [`Role`], [`Permission`], and the two many-to-many
//! association rows [`UserRole`] and [`RolePermission`]. The [`Directory`]
//! owns one repository per entity (built once at startup) plus the
//! graph-maintenance operations; the [`PermissionResolver`] answers
//! "what can this user do" and "can this user do all of these".

pub mod directory;
pub mod grants;
pub mod permission;
pub mod resolver;
pub mod role;
pub mod user;

pub use directory::{Directory, RbacContext, RbacStore};
pub use grants::{
    RolePermission, RolePermissionCreate, RolePermissionId, UserRole, UserRoleCreate, UserRoleId,
};
pub use permission::{Permission, PermissionCreate, PermissionId, PermissionUpdate};
pub use resolver::PermissionResolver;
pub use role::{Role, RoleCreate, RoleId, RoleUpdate};
pub use user::{User, UserCreate, UserUpdate};
