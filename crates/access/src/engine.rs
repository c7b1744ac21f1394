//! The generic entity-access engine.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use tracing::debug;

use entix_core::{AccessError, ConfigError, FieldValue, StoreError};

use crate::context::AccessContext;
use crate::descriptor::EntityDescriptor;
use crate::query::{ListQuery, QueryPlanner, SelectQuery};
use crate::schema::EntitySchema;
use crate::store::EntityStore;

/// Engine-wide list bounds.
#[derive(Debug, Copy, Clone)]
pub struct RepositoryConfig {
    /// Page size used when a list call does not specify one.
    pub default_page_size: u32,
    /// Hard ceiling a caller-supplied page size is clamped to.
    pub max_page_size: u32,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            default_page_size: 100,
            max_page_size: 1000,
        }
    }
}

impl RepositoryConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_page_size == 0
            || self.max_page_size == 0
            || self.default_page_size > self.max_page_size
        {
            return Err(ConfigError::InvalidPageBounds {
                default: self.default_page_size,
                max: self.max_page_size,
            });
        }
        Ok(())
    }
}

/// Create/read/update/delete/list over one entity type, through one context
/// type.
///
/// Construction is the validation point: the entity's declaration is
/// introspected into an [`EntityDescriptor`], and an entity that declares
/// audit columns is rejected outright when paired with a context type that
/// can never supply an acting user. After construction the repository is
/// immutable and freely shareable; build one per entity type at startup and
/// hand it to whatever consumes it.
///
/// Audit stamping is a pure function of (descriptor, context, identity
/// presence): the creator column is written on `create` and the modifier
/// column on `update`, exactly when the entity declares them and
/// `ctx.acting_user()` is present.
pub struct Repository<C, E> {
    planner: QueryPlanner,
    _context: PhantomData<fn(C)>,
    _entity: PhantomData<fn() -> E>,
}

impl<C, E> core::fmt::Debug for Repository<C, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Repository")
            .field("planner", &self.planner)
            .finish()
    }
}

impl<C, E> Repository<C, E>
where
    C: AccessContext,
    E: EntitySchema,
    C::Session: EntityStore<E>,
{
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_config(RepositoryConfig::default())
    }

    pub fn with_config(config: RepositoryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let descriptor = EntityDescriptor::of::<E>()?;
        if descriptor.has_audit() && !C::CARRIES_USER {
            return Err(ConfigError::AuditRequiresUser { table: E::TABLE });
        }
        Ok(Self {
            planner: QueryPlanner::new(descriptor, config.default_page_size, config.max_page_size),
            _context: PhantomData,
            _entity: PhantomData,
        })
    }

    pub fn descriptor(&self) -> &EntityDescriptor {
        self.planner.descriptor()
    }

    /// Primary-key lookup; absence is not an error.
    pub fn get(&self, id: &E::Id, ctx: &C) -> Result<Option<E>, AccessError> {
        Ok(ctx.session().get(id)?)
    }

    /// Primary-key lookup for callers that treat absence as exceptional.
    pub fn get_if_exist(&self, id: &E::Id, ctx: &C) -> Result<E, AccessError> {
        self.get(id, ctx)?
            .ok_or_else(|| AccessError::entity_not_found(E::TABLE, id))
    }

    /// Build a row from the input, stamp the creator when the entity tracks
    /// one and the context supplies an identity, and persist it.
    pub fn create(&self, input: E::Create, ctx: &C) -> Result<E, AccessError> {
        let mut row = E::from_create(input);
        if self.descriptor().has_audit() {
            if let Some(user) = ctx.acting_user() {
                row.stamp_creator(user);
            }
        }
        let row = ctx.session().insert(row)?;
        debug!(table = E::TABLE, id = %row.id(), "entity created");
        Ok(row)
    }

    /// Return the row matching `match_filters` if one exists, otherwise
    /// create from `input`. With `raise_on_conflict`, an existing match is a
    /// [`AccessError::DuplicateEntity`] instead of a result.
    pub fn create_if_not_exist(
        &self,
        input: E::Create,
        match_filters: &BTreeMap<String, FieldValue>,
        raise_on_conflict: bool,
        ctx: &C,
    ) -> Result<E, AccessError> {
        let clauses = self.planner.filters(match_filters)?;
        match ctx.session().find_one(&clauses)? {
            Some(_) if raise_on_conflict => Err(AccessError::DuplicateEntity { table: E::TABLE }),
            Some(existing) => Ok(existing),
            None => self.create(input, ctx),
        }
    }

    /// Load, partially apply `input`, stamp the modifier under the same rule
    /// as `create`, and persist. Fields unset in `input` keep their stored
    /// values.
    pub fn update(&self, id: &E::Id, input: &E::Update, ctx: &C) -> Result<E, AccessError> {
        let mut row = self.get_if_exist(id, ctx)?;
        row.apply_update(input);
        if self.descriptor().has_audit() {
            if let Some(user) = ctx.acting_user() {
                row.stamp_modifier(user);
            }
        }
        let row = ctx.session().update(row).map_err(|err| match err {
            StoreError::Missing => AccessError::entity_not_found(E::TABLE, id),
            other => other.into(),
        })?;
        debug!(table = E::TABLE, id = %row.id(), "entity updated");
        Ok(row)
    }

    /// Remove the row and return its pre-deletion snapshot.
    pub fn delete(&self, id: &E::Id, ctx: &C) -> Result<E, AccessError> {
        let removed = ctx
            .session()
            .remove(id)?
            .ok_or_else(|| AccessError::entity_not_found(E::TABLE, id))?;
        debug!(table = E::TABLE, id = %removed.id(), "entity deleted");
        Ok(removed)
    }

    /// List with pagination, sorting, and equality filters.
    ///
    /// Returns `(total_count, page)`: the count covers every row matching
    /// the filters regardless of the page window, and both sides come from
    /// the same session snapshot. Unknown sort/filter fields fail the whole
    /// call; an absent sort orders by primary key ascending so successive
    /// pages partition the result set.
    pub fn list(&self, query: &ListQuery, ctx: &C) -> Result<(u64, Vec<E>), AccessError> {
        let plan = self.planner.plan(query)?;
        Ok(ctx.session().select_page(&plan)?)
    }

    /// At most one row matching the validated filters; an ambiguous match is
    /// a store error, absence is `None`.
    pub fn find_one(
        &self,
        filters: &BTreeMap<String, FieldValue>,
        ctx: &C,
    ) -> Result<Option<E>, AccessError> {
        let clauses = self.planner.filters(filters)?;
        Ok(ctx.session().find_one(&clauses)?)
    }

    /// Every row matching the validated filters, in primary-key order.
    pub fn find_all(
        &self,
        filters: &BTreeMap<String, FieldValue>,
        ctx: &C,
    ) -> Result<Vec<E>, AccessError> {
        let clauses = self.planner.filters(filters)?;
        let query = SelectQuery::filtered(clauses, self.descriptor().primary_key());
        Ok(ctx.session().select_page(&query).map(|(_, rows)| rows)?)
    }
}
