//! In-memory entity store for tests and tooling.

use std::any::{Any, TypeId};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use entix_core::{FieldValue, StoreError};

use crate::query::{Direction, SelectQuery};
use crate::schema::EntitySchema;
use crate::store::EntityStore;

type Table<E> = HashMap<<E as EntitySchema>::Id, E>;

/// In-memory [`EntityStore`] over per-type tables.
///
/// Cloning yields another handle to the same tables, so one store can back
/// every session of a test. All operations take the lock exactly once,
/// which is what gives `select_page` its single-snapshot count/page pair.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<HashMap<TypeId, Box<dyn Any + Send + Sync>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<E: EntitySchema, R>(&self, f: impl FnOnce(Option<&Table<E>>) -> R) -> R {
        let tables = self.tables.read().unwrap();
        f(tables
            .get(&TypeId::of::<E>())
            .and_then(|table| table.downcast_ref::<Table<E>>()))
    }

    fn write<E: EntitySchema, R>(&self, f: impl FnOnce(&mut Table<E>) -> R) -> R {
        let mut tables = self.tables.write().unwrap();
        let table = tables
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::new(Table::<E>::new()));
        f(table
            .downcast_mut::<Table<E>>()
            .expect("table registered under its entity's TypeId"))
    }
}

fn matches<E: EntitySchema>(row: &E, clauses: &[(String, FieldValue)]) -> bool {
    clauses.iter().all(|(column, value)| row.field(column) == *value)
}

fn compare<E: EntitySchema>(a: &E, b: &E, order: &[(String, Direction)]) -> Ordering {
    for (column, direction) in order {
        let ordering = a.field(column).cmp(&b.field(column));
        let ordering = match direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

impl<E: EntitySchema> EntityStore<E> for MemoryStore {
    fn get(&self, id: &E::Id) -> Result<Option<E>, StoreError> {
        self.read::<E, _>(|table| Ok(table.and_then(|t| t.get(id)).cloned()))
    }

    fn insert(&self, row: E) -> Result<E, StoreError> {
        self.write::<E, _>(|table| {
            if table.contains_key(&row.id()) {
                return Err(StoreError::DuplicateKey);
            }
            table.insert(row.id(), row.clone());
            Ok(row)
        })
    }

    fn update(&self, row: E) -> Result<E, StoreError> {
        self.write::<E, _>(|table| {
            if !table.contains_key(&row.id()) {
                return Err(StoreError::Missing);
            }
            table.insert(row.id(), row.clone());
            Ok(row)
        })
    }

    fn remove(&self, id: &E::Id) -> Result<Option<E>, StoreError> {
        self.write::<E, _>(|table| Ok(table.remove(id)))
    }

    fn find_one(&self, clauses: &[(String, FieldValue)]) -> Result<Option<E>, StoreError> {
        self.read::<E, _>(|table| {
            let Some(table) = table else { return Ok(None) };
            let mut found = None;
            for row in table.values() {
                if matches(row, clauses) {
                    if found.is_some() {
                        return Err(StoreError::NonUnique);
                    }
                    found = Some(row.clone());
                }
            }
            Ok(found)
        })
    }

    fn find_many(&self, clauses: &[(String, FieldValue)]) -> Result<Vec<E>, StoreError> {
        let order = vec![(E::primary_key().to_string(), Direction::Asc)];
        self.read::<E, _>(|table| {
            let Some(table) = table else { return Ok(Vec::new()) };
            let mut rows: Vec<E> = table
                .values()
                .filter(|row| matches(*row, clauses))
                .cloned()
                .collect();
            rows.sort_by(|a, b| compare(a, b, &order));
            Ok(rows)
        })
    }

    fn select_page(&self, query: &SelectQuery) -> Result<(u64, Vec<E>), StoreError> {
        self.read::<E, _>(|table| {
            let Some(table) = table else { return Ok((0, Vec::new())) };
            let mut rows: Vec<E> = table
                .values()
                .filter(|row| matches(*row, &query.clauses))
                .cloned()
                .collect();
            let total = rows.len() as u64;
            rows.sort_by(|a, b| compare(a, b, &query.order));
            let page = rows
                .into_iter()
                .skip(query.offset as usize)
                .take(query.limit as usize)
                .collect();
            Ok((total, page))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SelectQuery;
    use crate::testing::{widget, Widget};

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for (name, quantity) in [("bolt", 3), ("gear", 5), ("gear", 8), ("cam", 1)] {
            EntityStore::<Widget>::insert(&store, widget(name, quantity)).unwrap();
        }
        store
    }

    #[test]
    fn insert_get_remove_round_trip() {
        let store = MemoryStore::new();
        let row = widget("bolt", 3);
        let id = row.id;

        let stored: Widget = store.insert(row).unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(EntityStore::<Widget>::get(&store, &id).unwrap().unwrap().name, "bolt");

        let removed: Option<Widget> = store.remove(&id).unwrap();
        assert_eq!(removed.unwrap().id, id);
        assert!(EntityStore::<Widget>::get(&store, &id).unwrap().is_none());
    }

    #[test]
    fn insert_rejects_duplicate_primary_key() {
        let store = MemoryStore::new();
        let row = widget("bolt", 3);
        store.insert(row.clone()).unwrap();
        assert_eq!(store.insert(row).unwrap_err(), StoreError::DuplicateKey);
    }

    #[test]
    fn update_requires_existing_row() {
        let store = MemoryStore::new();
        assert_eq!(
            store.update(widget("ghost", 0)).unwrap_err(),
            StoreError::Missing
        );
    }

    #[test]
    fn find_one_rejects_ambiguous_matches() {
        let store = seeded();
        let clauses = vec![("name".to_string(), "gear".into())];

        let err = EntityStore::<Widget>::find_one(&store, &clauses).unwrap_err();
        assert_eq!(err, StoreError::NonUnique);

        let clauses = vec![("name".to_string(), "cam".into())];
        let found = EntityStore::<Widget>::find_one(&store, &clauses).unwrap();
        assert_eq!(found.unwrap().quantity, 1);
    }

    #[test]
    fn select_page_counts_before_windowing() {
        let store = seeded();
        let query = SelectQuery {
            clauses: vec![("name".to_string(), "gear".into())],
            order: vec![("quantity".to_string(), Direction::Desc)],
            offset: 0,
            limit: 1,
        };

        let (total, page): (u64, Vec<Widget>) = store.select_page(&query).unwrap();
        assert_eq!(total, 2);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].quantity, 8);
    }

    #[test]
    fn clones_share_tables() {
        let store = seeded();
        let other = store.clone();
        let clauses: Vec<(String, FieldValue)> = Vec::new();
        let rows: Vec<Widget> = other.find_many(&clauses).unwrap();
        assert_eq!(rows.len(), 4);
    }
}
