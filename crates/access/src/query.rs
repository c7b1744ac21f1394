//! List-query validation: untrusted sort/filter input in, deterministic
//! query plans out.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use entix_core::{AccessError, ClauseKind, FieldValue};

use crate::descriptor::EntityDescriptor;

/// Sort direction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

/// One element of a sort specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    pub direction: Direction,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }
}

/// The list specification for one `list` call: pagination, sort, and
/// equality filters, exactly as handed over by the transport layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub sort: Vec<SortKey>,
    #[serde(default)]
    pub filters: BTreeMap<String, FieldValue>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn sort(mut self, key: SortKey) -> Self {
        self.sort.push(key);
        self
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }
}

/// A validated query ready for a storage session: conjunctive equality
/// clauses, a total ordering, and a page window.
///
/// Only the engine builds these; every column name has already been checked
/// against the entity's allow-lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    pub clauses: Vec<(String, FieldValue)>,
    pub order: Vec<(String, Direction)>,
    pub offset: u64,
    pub limit: u32,
}

impl SelectQuery {
    /// Clauses-only query, used for internal traversals that need every
    /// matching row in primary-key order.
    pub fn filtered(clauses: Vec<(String, FieldValue)>, primary_key: &str) -> Self {
        Self {
            clauses,
            order: vec![(primary_key.to_string(), Direction::Asc)],
            offset: 0,
            limit: u32::MAX,
        }
    }
}

/// Turns [`ListQuery`] values into [`SelectQuery`] plans for one entity.
///
/// Owned by a repository; immutable and cheap to share after construction.
#[derive(Debug, Clone)]
pub struct QueryPlanner {
    descriptor: EntityDescriptor,
    default_limit: u32,
    max_limit: u32,
}

impl QueryPlanner {
    pub fn new(descriptor: EntityDescriptor, default_limit: u32, max_limit: u32) -> Self {
        Self {
            descriptor,
            default_limit,
            max_limit,
        }
    }

    pub fn descriptor(&self) -> &EntityDescriptor {
        &self.descriptor
    }

    /// Validate a filter map against the filter allow-list.
    ///
    /// Unknown fields are an error, never silently dropped: a dropped filter
    /// would return rows the caller asked to exclude.
    pub fn filters(
        &self,
        filters: &BTreeMap<String, FieldValue>,
    ) -> Result<Vec<(String, FieldValue)>, AccessError> {
        let mut clauses = Vec::with_capacity(filters.len());
        for (field, value) in filters {
            if !self.descriptor.is_filterable(field) {
                return Err(AccessError::invalid_query(ClauseKind::Filter, field));
            }
            clauses.push((field.clone(), value.clone()));
        }
        Ok(clauses)
    }

    /// Validate a sort specification against the sort allow-list.
    ///
    /// An empty specification falls back to ascending primary key. The
    /// fallback is what keeps pagination stable: rows tied on an unspecified
    /// order have no guaranteed position across successive pages, which
    /// shows up as duplicated or missing rows while paging.
    pub fn order(&self, sort: &[SortKey]) -> Result<Vec<(String, Direction)>, AccessError> {
        if sort.is_empty() {
            return Ok(vec![(
                self.descriptor.primary_key().to_string(),
                Direction::Asc,
            )]);
        }

        let mut order = Vec::with_capacity(sort.len());
        for key in sort {
            if !self.descriptor.is_sortable(&key.field) {
                return Err(AccessError::invalid_query(ClauseKind::Sort, &key.field));
            }
            order.push((key.field.clone(), key.direction));
        }
        Ok(order)
    }

    /// Effective page size: the caller's limit clamped to the engine-wide
    /// maximum, or the default when absent.
    pub fn page_limit(&self, limit: Option<u32>) -> u32 {
        limit.unwrap_or(self.default_limit).min(self.max_limit)
    }

    /// Full plan for a list call. The count side of the call reuses
    /// `clauses` unchanged, so count and page always agree on the filter set.
    pub fn plan(&self, query: &ListQuery) -> Result<SelectQuery, AccessError> {
        Ok(SelectQuery {
            clauses: self.filters(&query.filters)?,
            order: self.order(&query.sort)?,
            offset: query.skip,
            limit: self.page_limit(query.limit),
        })
    }
}

/// Error from [`parse_sort_spec`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid sort direction '{direction}' for field '{field}'")]
pub struct SortParseError {
    pub field: String,
    pub direction: String,
}

/// Parse a compact sort specification of the form `"id:desc,created_at"`.
///
/// Each comma-separated item is a field name, optionally followed by
/// `:asc` or `:desc`; the direction defaults to ascending.
pub fn parse_sort_spec(spec: &str) -> Result<Vec<SortKey>, SortParseError> {
    let mut sort = Vec::new();
    for item in spec.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        match item.split_once(':') {
            None => sort.push(SortKey::asc(item)),
            Some((field, "asc")) => sort.push(SortKey::asc(field)),
            Some((field, "desc")) => sort.push(SortKey::desc(field)),
            Some((field, other)) => {
                return Err(SortParseError {
                    field: field.to_string(),
                    direction: other.to_string(),
                });
            }
        }
    }
    Ok(sort)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::EntityDescriptor;
    use crate::testing::Widget;

    fn planner() -> QueryPlanner {
        QueryPlanner::new(EntityDescriptor::of::<Widget>().unwrap(), 100, 1000)
    }

    #[test]
    fn empty_sort_falls_back_to_primary_key() {
        let order = planner().order(&[]).unwrap();
        assert_eq!(order, vec![("id".to_string(), Direction::Asc)]);
    }

    #[test]
    fn unknown_sort_field_is_rejected() {
        let err = planner().order(&[SortKey::desc("secret")]).unwrap_err();
        assert_eq!(
            err,
            AccessError::invalid_query(ClauseKind::Sort, "secret")
        );
    }

    #[test]
    fn unknown_filter_field_is_rejected() {
        let query = ListQuery::new().filter("nonexistent_field", 1i64);
        let err = planner().plan(&query).unwrap_err();
        assert_eq!(
            err,
            AccessError::invalid_query(ClauseKind::Filter, "nonexistent_field")
        );
    }

    #[test]
    fn limit_defaults_and_clamps() {
        let p = planner();
        assert_eq!(p.page_limit(None), 100);
        assert_eq!(p.page_limit(Some(25)), 25);
        assert_eq!(p.page_limit(Some(10_000)), 1000);
    }

    #[test]
    fn plan_carries_filters_and_window() {
        let query = ListQuery::new()
            .filter("name", "gear")
            .skip(10)
            .limit(5)
            .sort(SortKey::desc("quantity"));
        let plan = planner().plan(&query).unwrap();
        assert_eq!(plan.clauses.len(), 1);
        assert_eq!(plan.order, vec![("quantity".to_string(), Direction::Desc)]);
        assert_eq!(plan.offset, 10);
        assert_eq!(plan.limit, 5);
    }

    #[test]
    fn sort_spec_parses_directions() {
        let sort = parse_sort_spec("id:desc,created_at").unwrap();
        assert_eq!(sort, vec![SortKey::desc("id"), SortKey::asc("created_at")]);
    }

    #[test]
    fn sort_spec_rejects_unknown_direction() {
        let err = parse_sort_spec("name:sideways").unwrap_err();
        assert_eq!(err.field, "name");
        assert_eq!(err.direction, "sideways");
    }

    #[test]
    fn list_query_deserializes_from_transport_shape() {
        let raw = r#"{
            "skip": 2,
            "limit": 10,
            "sort": [{"field": "name", "direction": "desc"}],
            "filters": {"name": "gear"}
        }"#;
        let query: ListQuery = serde_json::from_str(raw).unwrap();
        assert_eq!(query.skip, 2);
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.sort, vec![SortKey::desc("name")]);
        assert_eq!(
            query.filters.get("name"),
            Some(&FieldValue::Text("gear".into()))
        );
    }
}
