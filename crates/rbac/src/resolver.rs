//! Permission resolution: user → roles → permissions.

use std::collections::BTreeSet;

use entix_access::EntityStore;
use entix_core::{AccessError, FieldValue};

use crate::directory::RbacStore;
use crate::grants::{RolePermission, UserRole};
use crate::permission::{Permission, PermissionId};
use crate::role::Role;
use crate::user::User;

/// Resolves a user's effective permission set through the role/permission
/// graph.
///
/// Resolution is over sets: a permission reachable through several roles
/// counts once, and a user with no roles resolves to the empty set. The
/// superuser flag short-circuits [`has_permissions`](Self::has_permissions)
/// only — it does not inflate the enumerated set.
///
/// A `false` answer is a value for the caller to act on, not an error;
/// denying access is the caller's job.
pub struct PermissionResolver<'s, S> {
    store: &'s S,
}

impl<'s, S: RbacStore> PermissionResolver<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Every permission name reachable through the user's roles.
    pub fn get_permissions(&self, user: &User) -> Result<BTreeSet<String>, AccessError> {
        let clauses = vec![("user_id".to_string(), FieldValue::from(user.id))];
        let links = <S as EntityStore<UserRole>>::find_many(self.store, &clauses)?;

        let mut permission_ids: BTreeSet<PermissionId> = BTreeSet::new();
        for link in links {
            let clauses = vec![("role_id".to_string(), FieldValue::from(link.role_id))];
            let grants = <S as EntityStore<RolePermission>>::find_many(self.store, &clauses)?;
            permission_ids.extend(grants.into_iter().map(|grant| grant.permission_id));
        }

        let mut names = BTreeSet::new();
        for permission_id in permission_ids {
            let permission = <S as EntityStore<Permission>>::get(self.store, &permission_id)?;
            if let Some(permission) = permission {
                names.insert(permission.name);
            }
        }
        Ok(names)
    }

    /// `true` iff the user holds **all** of `required`.
    ///
    /// Superusers pass unconditionally; an empty `required` is trivially
    /// satisfied; a partial match is a failure.
    pub fn has_permissions(&self, user: &User, required: &[&str]) -> Result<bool, AccessError> {
        if user.is_superuser {
            return Ok(true);
        }
        let held = self.get_permissions(user)?;
        Ok(required.iter().all(|name| held.contains(*name)))
    }

    /// `true` iff the user is assigned **all** of the named roles.
    pub fn has_roles(&self, user: &User, required: &[&str]) -> Result<bool, AccessError> {
        let clauses = vec![("user_id".to_string(), FieldValue::from(user.id))];
        let links = <S as EntityStore<UserRole>>::find_many(self.store, &clauses)?;

        let mut names = BTreeSet::new();
        for link in links {
            let role = <S as EntityStore<Role>>::get(self.store, &link.role_id)?;
            if let Some(role) = role {
                names.insert(role.name);
            }
        }
        Ok(required.iter().all(|name| names.contains(*name)))
    }
}
