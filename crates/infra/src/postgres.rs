//! Postgres-backed entity store.
//!
//! Implements the [`EntityStore`] session contract over a SQLx connection
//! pool. SQL is assembled dynamically with [`QueryBuilder`]; every
//! interpolated identifier is re-checked against the entity's declared
//! column set (values are always bound, never interpolated). The engine has
//! already validated clause fields against the entity's allow-lists by the
//! time they reach this module.
//!
//! ## Thread safety and runtime
//!
//! The pool is `Arc`-backed and shared freely. The store presents the sync
//! `EntityStore` facade by blocking on the ambient tokio runtime handle, the
//! same bridge the rest of the workspace's sync call paths use; calls from a
//! thread without an entered runtime fail with a backend error rather than
//! panicking.
//!
//! ## Snapshot pairing
//!
//! `select_page` runs its count and page queries inside one transaction, so
//! the pair observes a single snapshot even under concurrent writers.

use std::future::Future;

use sqlx::postgres::{PgPool, PgRow, Postgres};
use sqlx::{QueryBuilder, Row};
use tracing::Span;
use uuid::Uuid;

use entix_access::{Direction, EntitySchema, EntityStore, SelectQuery};
use entix_core::{FieldValue, StoreError, UserId};
use entix_rbac::{Permission, Role, RolePermission, User, UserRole};

/// Row-mapping contract for entities persisted through [`PgStore`].
pub trait PgMapped: EntitySchema {
    fn from_pg_row(row: &PgRow) -> Result<Self, sqlx::Error>;
}

/// Postgres-backed [`EntityStore`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn run<T>(&self, fut: impl Future<Output = Result<T, StoreError>>) -> Result<T, StoreError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|_| StoreError::Backend("no tokio runtime available".to_string()))?;
        handle.block_on(fut)
    }
}

fn to_store_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::Missing,
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateKey,
        other => StoreError::Backend(other.to_string()),
    }
}

fn check_column<E: EntitySchema>(column: &str) -> Result<(), StoreError> {
    if E::columns().iter().any(|declared| *declared == column) {
        Ok(())
    } else {
        Err(StoreError::Backend(format!(
            "undeclared column '{column}' for table '{}'",
            E::TABLE
        )))
    }
}

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: FieldValue) {
    match value {
        FieldValue::Null => {
            qb.push("NULL");
        }
        FieldValue::Bool(v) => {
            qb.push_bind(v);
        }
        FieldValue::Int(v) => {
            qb.push_bind(v);
        }
        FieldValue::Float(v) => {
            qb.push_bind(v);
        }
        FieldValue::Uuid(v) => {
            qb.push_bind(v);
        }
        FieldValue::Timestamp(v) => {
            qb.push_bind(v);
        }
        FieldValue::Text(v) => {
            qb.push_bind(v);
        }
    }
}

/// Append `WHERE c1 = $n AND ...` (with `IS NULL` for null values).
fn push_clauses<E: EntitySchema>(
    qb: &mut QueryBuilder<'_, Postgres>,
    clauses: &[(String, FieldValue)],
) -> Result<(), StoreError> {
    for (i, (column, value)) in clauses.iter().enumerate() {
        check_column::<E>(column)?;
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        qb.push(column.as_str());
        if value.is_null() {
            qb.push(" IS NULL");
        } else {
            qb.push(" = ");
            push_value(qb, value.clone());
        }
    }
    Ok(())
}

fn push_order<E: EntitySchema>(
    qb: &mut QueryBuilder<'_, Postgres>,
    order: &[(String, Direction)],
) -> Result<(), StoreError> {
    for (i, (column, direction)) in order.iter().enumerate() {
        check_column::<E>(column)?;
        qb.push(if i == 0 { " ORDER BY " } else { ", " });
        qb.push(column.as_str());
        qb.push(match direction {
            Direction::Asc => " ASC",
            Direction::Desc => " DESC",
        });
    }
    Ok(())
}

fn select_builder<E: EntitySchema>(
    clauses: &[(String, FieldValue)],
) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
    let mut qb = QueryBuilder::new("SELECT * FROM ");
    qb.push(E::TABLE);
    push_clauses::<E>(&mut qb, clauses)?;
    Ok(qb)
}

fn count_builder<E: EntitySchema>(
    clauses: &[(String, FieldValue)],
) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM ");
    qb.push(E::TABLE);
    push_clauses::<E>(&mut qb, clauses)?;
    Ok(qb)
}

fn insert_builder<E: EntitySchema>(row: &E) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("INSERT INTO ");
    qb.push(E::TABLE);
    qb.push(" (");
    for (i, column) in E::columns().iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        qb.push(*column);
    }
    qb.push(") VALUES (");
    for (i, column) in E::columns().iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        push_value(&mut qb, row.field(column));
    }
    qb.push(") RETURNING *");
    qb
}

fn update_builder<E: EntitySchema>(row: &E) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("UPDATE ");
    qb.push(E::TABLE);
    qb.push(" SET ");
    let mut first = true;
    for column in E::columns() {
        if *column == E::primary_key() {
            continue;
        }
        if !first {
            qb.push(", ");
        }
        first = false;
        qb.push(*column);
        qb.push(" = ");
        push_value(&mut qb, row.field(column));
    }
    qb.push(" WHERE ");
    qb.push(E::primary_key());
    qb.push(" = ");
    push_value(&mut qb, row.id().into());
    qb.push(" RETURNING *");
    qb
}

impl<E: PgMapped> EntityStore<E> for PgStore {
    fn get(&self, id: &E::Id) -> Result<Option<E>, StoreError> {
        let id_value: FieldValue = id.clone().into();
        self.run(async {
            let mut qb = QueryBuilder::new("SELECT * FROM ");
            qb.push(E::TABLE);
            qb.push(" WHERE ");
            qb.push(E::primary_key());
            qb.push(" = ");
            push_value(&mut qb, id_value);
            let row = qb
                .build()
                .fetch_optional(&self.pool)
                .await
                .map_err(to_store_error)?;
            row.map(|r| E::from_pg_row(&r)).transpose().map_err(to_store_error)
        })
    }

    fn insert(&self, row: E) -> Result<E, StoreError> {
        self.run(async {
            let span = Span::current();
            span.record("operation", "insert");

            let mut qb = insert_builder(&row);
            let stored = qb
                .build()
                .fetch_one(&self.pool)
                .await
                .map_err(to_store_error)?;
            E::from_pg_row(&stored).map_err(to_store_error)
        })
    }

    fn update(&self, row: E) -> Result<E, StoreError> {
        self.run(async {
            let mut qb = update_builder(&row);
            let stored = qb
                .build()
                .fetch_optional(&self.pool)
                .await
                .map_err(to_store_error)?
                .ok_or(StoreError::Missing)?;
            E::from_pg_row(&stored).map_err(to_store_error)
        })
    }

    fn remove(&self, id: &E::Id) -> Result<Option<E>, StoreError> {
        let id_value: FieldValue = id.clone().into();
        self.run(async {
            let mut qb = QueryBuilder::new("DELETE FROM ");
            qb.push(E::TABLE);
            qb.push(" WHERE ");
            qb.push(E::primary_key());
            qb.push(" = ");
            push_value(&mut qb, id_value);
            qb.push(" RETURNING *");
            let row = qb
                .build()
                .fetch_optional(&self.pool)
                .await
                .map_err(to_store_error)?;
            row.map(|r| E::from_pg_row(&r)).transpose().map_err(to_store_error)
        })
    }

    fn find_one(&self, clauses: &[(String, FieldValue)]) -> Result<Option<E>, StoreError> {
        self.run(async {
            let mut qb = select_builder::<E>(clauses)?;
            qb.push(" LIMIT 2");
            let rows = qb
                .build()
                .fetch_all(&self.pool)
                .await
                .map_err(to_store_error)?;
            if rows.len() > 1 {
                return Err(StoreError::NonUnique);
            }
            rows.first()
                .map(E::from_pg_row)
                .transpose()
                .map_err(to_store_error)
        })
    }

    fn find_many(&self, clauses: &[(String, FieldValue)]) -> Result<Vec<E>, StoreError> {
        self.run(async {
            let mut qb = select_builder::<E>(clauses)?;
            qb.push(" ORDER BY ");
            qb.push(E::primary_key());
            qb.push(" ASC");
            let rows = qb
                .build()
                .fetch_all(&self.pool)
                .await
                .map_err(to_store_error)?;
            rows.iter()
                .map(E::from_pg_row)
                .collect::<Result<Vec<_>, _>>()
                .map_err(to_store_error)
        })
    }

    fn select_page(&self, query: &SelectQuery) -> Result<(u64, Vec<E>), StoreError> {
        self.run(async {
            let mut tx = self.pool.begin().await.map_err(to_store_error)?;

            let mut count_qb = count_builder::<E>(&query.clauses)?;
            let count_row = count_qb
                .build()
                .fetch_one(&mut *tx)
                .await
                .map_err(to_store_error)?;
            let total: i64 = count_row.try_get(0).map_err(to_store_error)?;

            let mut page_qb = select_builder::<E>(&query.clauses)?;
            push_order::<E>(&mut page_qb, &query.order)?;
            page_qb.push(" OFFSET ");
            page_qb.push_bind(query.offset as i64);
            page_qb.push(" LIMIT ");
            page_qb.push_bind(i64::from(query.limit));
            let rows = page_qb
                .build()
                .fetch_all(&mut *tx)
                .await
                .map_err(to_store_error)?;

            tx.commit().await.map_err(to_store_error)?;

            let page = rows
                .iter()
                .map(E::from_pg_row)
                .collect::<Result<Vec<_>, _>>()
                .map_err(to_store_error)?;
            Ok((total as u64, page))
        })
    }
}

impl PgMapped for User {
    fn from_pg_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get::<Uuid, _>("id")?.into(),
            name: row.try_get("name")?,
            surname: row.try_get("surname")?,
            email: row.try_get("email")?,
            is_active: row.try_get("is_active")?,
            is_superuser: row.try_get("is_superuser")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl PgMapped for Role {
    fn from_pg_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get::<Uuid, _>("id")?.into(),
            name: row.try_get("name")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            created_by: row.try_get::<Option<Uuid>, _>("created_by")?.map(UserId::from_uuid),
            updated_by: row.try_get::<Option<Uuid>, _>("updated_by")?.map(UserId::from_uuid),
        })
    }
}

impl PgMapped for Permission {
    fn from_pg_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get::<Uuid, _>("id")?.into(),
            name: row.try_get("name")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            created_by: row.try_get::<Option<Uuid>, _>("created_by")?.map(UserId::from_uuid),
            updated_by: row.try_get::<Option<Uuid>, _>("updated_by")?.map(UserId::from_uuid),
        })
    }
}

impl PgMapped for UserRole {
    fn from_pg_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get::<Uuid, _>("id")?.into(),
            user_id: row.try_get::<Uuid, _>("user_id")?.into(),
            role_id: row.try_get::<Uuid, _>("role_id")?.into(),
            created_at: row.try_get("created_at")?,
            created_by: row.try_get::<Option<Uuid>, _>("created_by")?.map(UserId::from_uuid),
            updated_by: row.try_get::<Option<Uuid>, _>("updated_by")?.map(UserId::from_uuid),
        })
    }
}

impl PgMapped for RolePermission {
    fn from_pg_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get::<Uuid, _>("id")?.into(),
            role_id: row.try_get::<Uuid, _>("role_id")?.into(),
            permission_id: row.try_get::<Uuid, _>("permission_id")?.into(),
            created_at: row.try_get("created_at")?,
            created_by: row.try_get::<Option<Uuid>, _>("created_by")?.map(UserId::from_uuid),
            updated_by: row.try_get::<Option<Uuid>, _>("updated_by")?.map(UserId::from_uuid),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_renders_binds_and_null_clauses() {
        let clauses = vec![
            ("name".to_string(), FieldValue::Text("editor".to_string())),
            ("updated_by".to_string(), FieldValue::Null),
        ];
        let mut qb = select_builder::<Role>(&clauses).unwrap();
        assert_eq!(
            qb.sql(),
            "SELECT * FROM roles WHERE name = $1 AND updated_by IS NULL"
        );
    }

    #[test]
    fn undeclared_clause_column_is_refused() {
        let clauses = vec![("nonexistent_field".to_string(), FieldValue::Int(1))];
        let err = select_builder::<Role>(&clauses).err().unwrap();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[test]
    fn order_renders_directions() {
        let mut qb = select_builder::<Role>(&[]).unwrap();
        let order = vec![
            ("name".to_string(), Direction::Desc),
            ("id".to_string(), Direction::Asc),
        ];
        push_order::<Role>(&mut qb, &order).unwrap();
        assert_eq!(qb.sql(), "SELECT * FROM roles ORDER BY name DESC, id ASC");
    }

    #[test]
    fn insert_lists_every_declared_column() {
        let role = <Role as EntitySchema>::from_create(entix_rbac::RoleCreate {
            name: "editor".to_string(),
            is_active: true,
        });
        let qb = insert_builder(&role);
        let sql = qb.sql();
        assert!(sql.starts_with("INSERT INTO roles (id, name, is_active"));
        assert!(sql.ends_with("RETURNING *"));
        // created_by/updated_by are unstamped here, so they render as NULL.
        assert!(sql.contains("NULL"));
    }

    #[test]
    fn update_excludes_primary_key_from_set_list() {
        let role = <Role as EntitySchema>::from_create(entix_rbac::RoleCreate {
            name: "editor".to_string(),
            is_active: true,
        });
        let qb = update_builder(&role);
        let sql = qb.sql();
        assert!(sql.starts_with("UPDATE roles SET name = $1"));
        assert!(sql.contains("WHERE id = "));
        assert!(!sql.contains("SET id"));
    }

    // Round-trip against a live database; opt in with
    //   DATABASE_URL=postgres://... cargo test -p entix-infra -- --ignored
    #[test]
    #[ignore]
    fn postgres_round_trip() -> anyhow::Result<()> {
        use entix_access::{ListQuery, MaybeUserContext};
        use entix_rbac::{Directory, PermissionResolver, RoleCreate, UserCreate};

        let url = std::env::var("DATABASE_URL")?;
        let rt = tokio::runtime::Runtime::new()?;
        let pool = rt.block_on(sqlx::postgres::PgPool::connect(&url))?;
        rt.block_on(async {
            for ddl in [
                "CREATE TABLE IF NOT EXISTS users (
                    id UUID PRIMARY KEY,
                    name TEXT NOT NULL,
                    surname TEXT NOT NULL,
                    email TEXT NOT NULL,
                    is_active BOOLEAN NOT NULL,
                    is_superuser BOOLEAN NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL,
                    updated_at TIMESTAMPTZ
                )",
                "CREATE TABLE IF NOT EXISTS roles (
                    id UUID PRIMARY KEY,
                    name TEXT NOT NULL,
                    is_active BOOLEAN NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL,
                    updated_at TIMESTAMPTZ,
                    created_by UUID REFERENCES users (id),
                    updated_by UUID REFERENCES users (id)
                )",
                "CREATE TABLE IF NOT EXISTS permissions (
                    id UUID PRIMARY KEY,
                    name TEXT NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL,
                    updated_at TIMESTAMPTZ,
                    created_by UUID REFERENCES users (id),
                    updated_by UUID REFERENCES users (id)
                )",
                "CREATE TABLE IF NOT EXISTS users_roles (
                    id UUID PRIMARY KEY,
                    user_id UUID NOT NULL REFERENCES users (id),
                    role_id UUID NOT NULL REFERENCES roles (id),
                    created_at TIMESTAMPTZ NOT NULL,
                    created_by UUID REFERENCES users (id),
                    updated_by UUID REFERENCES users (id)
                )",
                "CREATE TABLE IF NOT EXISTS roles_permissions (
                    id UUID PRIMARY KEY,
                    role_id UUID NOT NULL REFERENCES roles (id),
                    permission_id UUID NOT NULL REFERENCES permissions (id),
                    created_at TIMESTAMPTZ NOT NULL,
                    created_by UUID REFERENCES users (id),
                    updated_by UUID REFERENCES users (id)
                )",
            ] {
                sqlx::query(ddl).execute(&pool).await?;
            }
            anyhow::Ok(())
        })?;

        let _guard = rt.enter();
        let store = PgStore::new(pool);
        let directory: Directory<PgStore> = Directory::new()?;
        let ctx = MaybeUserContext::new(store.clone(), None);

        let marker = uuid::Uuid::now_v7().simple().to_string();
        let user = directory.users().create(
            UserCreate {
                name: "Round".to_string(),
                surname: "Trip".to_string(),
                email: format!("{marker}@example.com"),
                is_active: true,
                is_superuser: false,
            },
            &ctx,
        )?;
        let role = directory.roles().create(
            RoleCreate {
                name: format!("role-{marker}"),
                is_active: true,
            },
            &ctx,
        )?;
        let permission = directory.permissions().create(
            entix_rbac::PermissionCreate {
                name: format!("perm-{marker}:write"),
            },
            &ctx,
        )?;

        directory.assign_role(user.id, role.id, &ctx)?;
        directory.grant_permission(role.id, permission.id, &ctx)?;

        let resolver = PermissionResolver::new(&store);
        let required = format!("perm-{marker}:write");
        assert!(resolver.has_permissions(&user, &[required.as_str()])?);

        let (total, page) = directory.roles().list(
            &ListQuery::new().filter("name", format!("role-{marker}")),
            &ctx,
        )?;
        assert_eq!(total, 1);
        assert_eq!(page[0].id, role.id);

        Ok(())
    }
}
