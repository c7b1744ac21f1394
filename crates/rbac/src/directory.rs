//! The directory: one repository per graph entity, plus graph maintenance.

use std::collections::BTreeMap;

use tracing::debug;

use entix_access::{EntityStore, MaybeUserContext, Repository};
use entix_core::{AccessError, ConfigError, FieldValue, UserId};

use crate::grants::{RolePermission, RolePermissionCreate, UserRole, UserRoleCreate};
use crate::permission::{Permission, PermissionId};
use crate::role::{Role, RoleId};
use crate::user::User;

/// Session capable of persisting every entity of the permission graph.
pub trait RbacStore:
    EntityStore<User>
    + EntityStore<Role>
    + EntityStore<Permission>
    + EntityStore<UserRole>
    + EntityStore<RolePermission>
{
}

impl<S> RbacStore for S where
    S: EntityStore<User>
        + EntityStore<Role>
        + EntityStore<Permission>
        + EntityStore<UserRole>
        + EntityStore<RolePermission>
{
}

/// Context used by directory operations.
///
/// `MaybeUserContext` rather than `UserContext`: the graph's write paths
/// want the acting identity when one exists, but bootstrap flows (seeding
/// the first user and roles) legitimately run without one.
pub type RbacContext<S> = MaybeUserContext<S>;

fn filter_map(pairs: &[(&str, FieldValue)]) -> BTreeMap<String, FieldValue> {
    pairs
        .iter()
        .map(|(field, value)| (field.to_string(), value.clone()))
        .collect()
}

/// Repositories over the permission graph plus its maintenance operations.
///
/// Built once at application startup and passed to whatever consumes it;
/// the association operations are idempotent, so re-running a seed or
/// replaying a request cannot produce duplicate graph edges.
pub struct Directory<S: RbacStore> {
    users: Repository<RbacContext<S>, User>,
    roles: Repository<RbacContext<S>, Role>,
    permissions: Repository<RbacContext<S>, Permission>,
    user_roles: Repository<RbacContext<S>, UserRole>,
    role_permissions: Repository<RbacContext<S>, RolePermission>,
}

impl<S: RbacStore> Directory<S> {
    pub fn new() -> Result<Self, ConfigError> {
        Ok(Self {
            users: Repository::new()?,
            roles: Repository::new()?,
            permissions: Repository::new()?,
            user_roles: Repository::new()?,
            role_permissions: Repository::new()?,
        })
    }

    pub fn users(&self) -> &Repository<RbacContext<S>, User> {
        &self.users
    }

    pub fn roles(&self) -> &Repository<RbacContext<S>, Role> {
        &self.roles
    }

    pub fn permissions(&self) -> &Repository<RbacContext<S>, Permission> {
        &self.permissions
    }

    pub fn user_by_email(
        &self,
        email: &str,
        ctx: &RbacContext<S>,
    ) -> Result<Option<User>, AccessError> {
        self.users
            .find_one(&filter_map(&[("email", email.into())]), ctx)
    }

    pub fn role_by_name(
        &self,
        name: &str,
        ctx: &RbacContext<S>,
    ) -> Result<Option<Role>, AccessError> {
        self.roles
            .find_one(&filter_map(&[("name", name.into())]), ctx)
    }

    pub fn permission_by_name(
        &self,
        name: &str,
        ctx: &RbacContext<S>,
    ) -> Result<Option<Permission>, AccessError> {
        self.permissions
            .find_one(&filter_map(&[("name", name.into())]), ctx)
    }

    /// Assign a role to a user. Idempotent: an existing assignment is
    /// returned unchanged.
    pub fn assign_role(
        &self,
        user_id: UserId,
        role_id: RoleId,
        ctx: &RbacContext<S>,
    ) -> Result<UserRole, AccessError> {
        self.users.get_if_exist(&user_id, ctx)?;
        self.roles.get_if_exist(&role_id, ctx)?;

        let filters = filter_map(&[("user_id", user_id.into()), ("role_id", role_id.into())]);
        let link = self.user_roles.create_if_not_exist(
            UserRoleCreate { user_id, role_id },
            &filters,
            false,
            ctx,
        )?;
        debug!(user = %user_id, role = %role_id, "role assigned");
        Ok(link)
    }

    /// Remove a role from a user. Idempotent: a missing assignment is not an
    /// error.
    pub fn remove_role(
        &self,
        user_id: UserId,
        role_id: RoleId,
        ctx: &RbacContext<S>,
    ) -> Result<(), AccessError> {
        self.users.get_if_exist(&user_id, ctx)?;
        self.roles.get_if_exist(&role_id, ctx)?;

        let filters = filter_map(&[("user_id", user_id.into()), ("role_id", role_id.into())]);
        if let Some(link) = self.user_roles.find_one(&filters, ctx)? {
            self.user_roles.delete(&link.id, ctx)?;
            debug!(user = %user_id, role = %role_id, "role removed");
        }
        Ok(())
    }

    /// Grant a permission to a role. Idempotent.
    pub fn grant_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
        ctx: &RbacContext<S>,
    ) -> Result<RolePermission, AccessError> {
        self.roles.get_if_exist(&role_id, ctx)?;
        self.permissions.get_if_exist(&permission_id, ctx)?;

        let filters = filter_map(&[
            ("role_id", role_id.into()),
            ("permission_id", permission_id.into()),
        ]);
        let grant = self.role_permissions.create_if_not_exist(
            RolePermissionCreate {
                role_id,
                permission_id,
            },
            &filters,
            false,
            ctx,
        )?;
        debug!(role = %role_id, permission = %permission_id, "permission granted");
        Ok(grant)
    }

    /// Revoke a permission from a role. Idempotent.
    pub fn revoke_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
        ctx: &RbacContext<S>,
    ) -> Result<(), AccessError> {
        self.roles.get_if_exist(&role_id, ctx)?;
        self.permissions.get_if_exist(&permission_id, ctx)?;

        let filters = filter_map(&[
            ("role_id", role_id.into()),
            ("permission_id", permission_id.into()),
        ]);
        if let Some(grant) = self.role_permissions.find_one(&filters, ctx)? {
            self.role_permissions.delete(&grant.id, ctx)?;
        }
        Ok(())
    }

    /// Drop every role grant of a permission, leaving the permission itself.
    pub fn purge_role_grants(
        &self,
        permission_id: PermissionId,
        ctx: &RbacContext<S>,
    ) -> Result<Permission, AccessError> {
        let permission = self.permissions.get_if_exist(&permission_id, ctx)?;

        let filters = filter_map(&[("permission_id", permission_id.into())]);
        for grant in self.role_permissions.find_all(&filters, ctx)? {
            self.role_permissions.delete(&grant.id, ctx)?;
        }
        Ok(permission)
    }

    /// Delete a permission along with all of its role grants.
    pub fn delete_permission(
        &self,
        permission_id: PermissionId,
        ctx: &RbacContext<S>,
    ) -> Result<Permission, AccessError> {
        self.purge_role_grants(permission_id, ctx)?;
        self.permissions.delete(&permission_id, ctx)
    }

    /// Roles currently assigned to a user.
    pub fn roles_of(
        &self,
        user_id: UserId,
        ctx: &RbacContext<S>,
    ) -> Result<Vec<Role>, AccessError> {
        let filters = filter_map(&[("user_id", user_id.into())]);
        let links = self.user_roles.find_all(&filters, ctx)?;
        let mut roles = Vec::with_capacity(links.len());
        for link in links {
            if let Some(role) = self.roles.get(&link.role_id, ctx)? {
                roles.push(role);
            }
        }
        Ok(roles)
    }

    /// Users currently assigned to a role.
    pub fn users_in_role(
        &self,
        role_id: RoleId,
        ctx: &RbacContext<S>,
    ) -> Result<Vec<User>, AccessError> {
        let filters = filter_map(&[("role_id", role_id.into())]);
        let links = self.user_roles.find_all(&filters, ctx)?;
        let mut users = Vec::with_capacity(links.len());
        for link in links {
            if let Some(user) = self.users.get(&link.user_id, ctx)? {
                users.push(user);
            }
        }
        Ok(users)
    }

    /// Permissions currently granted to a role.
    pub fn permissions_of_role(
        &self,
        role_id: RoleId,
        ctx: &RbacContext<S>,
    ) -> Result<Vec<Permission>, AccessError> {
        let filters = filter_map(&[("role_id", role_id.into())]);
        let grants = self.role_permissions.find_all(&filters, ctx)?;
        let mut permissions = Vec::with_capacity(grants.len());
        for grant in grants {
            if let Some(permission) = self.permissions.get(&grant.permission_id, ctx)? {
                permissions.push(permission);
            }
        }
        Ok(permissions)
    }
}
