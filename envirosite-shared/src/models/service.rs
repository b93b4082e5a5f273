/// Consulting service model
///
/// A service is a named offering (e.g. "Environmental Impact Assessment").
/// Projects reference services through the `project_services` join table.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE services (
///     id SERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,        -- unique on LOWER(name)
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use crate::listing::{push_order_and_page, push_search, ListQuery, Page, SortOrder, SortSpec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

const COLUMNS: &str = "id, name, created_at, updated_at";

/// Sortable columns for the service list
pub const SERVICE_SORT: SortSpec = SortSpec {
    allowed: &[("id", "id"), ("name", "name"), ("createdAt", "created_at")],
    default_column: "name",
    default_order: SortOrder::Asc,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Service {
    pub async fn create(pool: &PgPool, name: &str) -> Result<Self, sqlx::Error> {
        let service = sqlx::query_as::<_, Service>(&format!(
            "INSERT INTO services (name) VALUES ($1) RETURNING {}",
            COLUMNS
        ))
        .bind(name)
        .fetch_one(pool)
        .await?;

        Ok(service)
    }

    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        let service = sqlx::query_as::<_, Service>(&format!("SELECT {} FROM services WHERE id = $1", COLUMNS))
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(service)
    }

    /// Checks whether `name` is used by a service other than `exclude_id`
    ///
    /// Names are compared case-insensitively.
    pub async fn name_taken(
        pool: &PgPool,
        name: &str,
        exclude_id: Option<i32>,
    ) -> Result<bool, sqlx::Error> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM services WHERE LOWER(name) = LOWER($1) AND ($2::INT IS NULL OR id <> $2))",
        )
        .bind(name)
        .bind(exclude_id)
        .fetch_one(pool)
        .await?;

        Ok(taken)
    }

    /// Renames a service; `None` if it doesn't exist
    pub async fn update(pool: &PgPool, id: i32, name: &str) -> Result<Option<Self>, sqlx::Error> {
        let service = sqlx::query_as::<_, Service>(&format!(
            "UPDATE services SET name = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            COLUMNS
        ))
        .bind(id)
        .bind(name)
        .fetch_optional(pool)
        .await?;

        Ok(service)
    }

    /// Deletes the service row
    ///
    /// Join rows must already be gone (see `ProjectService::delete_for_service`);
    /// run both on the same transaction.
    pub async fn delete(conn: &mut PgConnection, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM services WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Returns which of `ids` exist, locking those rows until the transaction ends
    ///
    /// The lock keeps a concurrent service delete from slipping in between the
    /// existence check and the join-row insert.
    pub async fn existing_ids(conn: &mut PgConnection, ids: &[i32]) -> Result<Vec<i32>, sqlx::Error> {
        let found: Vec<i32> = sqlx::query_scalar(
            "SELECT id FROM services WHERE id = ANY($1) ORDER BY id FOR SHARE",
        )
        .bind(ids)
        .fetch_all(conn)
        .await?;

        Ok(found)
    }

    pub async fn list(pool: &PgPool, query: &ListQuery) -> Result<Page<Self>, sqlx::Error> {
        let pagination = query.pagination();
        let pattern = query.search_pattern();
        let (column, order) = query.order_by(&SERVICE_SORT);

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM services");
        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM services", COLUMNS));

        if let Some(pattern) = &pattern {
            for qb in [&mut count, &mut select] {
                qb.push(" WHERE ");
                push_search(qb, &["name"], pattern);
            }
        }

        push_order_and_page(&mut select, column, order, pagination);

        let total: i64 = count.build_query_scalar().fetch_one(pool).await?;
        let items = select.build_query_as::<Service>().fetch_all(pool).await?;

        Ok(Page {
            items,
            meta: pagination.meta(total),
        })
    }
}
