/// Project ↔ Service join rows
///
/// A project's service set is never diffed: every write deletes all of the
/// project's join rows and inserts the new set. All functions here take a
/// connection so callers can run them inside their transaction.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE project_services (
///     project_id INTEGER NOT NULL REFERENCES projects (id),
///     service_id INTEGER NOT NULL REFERENCES services (id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (project_id, service_id)
/// );
/// ```

use crate::models::service::Service;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor, Postgres, QueryBuilder};

/// One project-offers-service association
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectService {
    pub project_id: i32,
    pub service_id: i32,
}

/// A service joined to the project it belongs to
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LinkedService {
    pub project_id: i32,
    #[sqlx(flatten)]
    pub service: Service,
}

impl ProjectService {
    /// Bulk-inserts one join row per service id
    pub async fn insert_many(
        conn: &mut PgConnection,
        project_id: i32,
        service_ids: &[i32],
    ) -> Result<Vec<Self>, sqlx::Error> {
        if service_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO project_services (project_id, service_id) ");
        qb.push_values(service_ids, |mut row, service_id| {
            row.push_bind(project_id).push_bind(*service_id);
        });
        qb.push(" RETURNING project_id, service_id");

        let rows = qb.build_query_as::<ProjectService>().fetch_all(conn).await?;

        Ok(rows)
    }

    /// Replaces a project's service set wholesale (delete-all-then-reinsert)
    pub async fn replace_for_project(
        conn: &mut PgConnection,
        project_id: i32,
        service_ids: &[i32],
    ) -> Result<Vec<Self>, sqlx::Error> {
        Self::delete_for_project(&mut *conn, project_id).await?;
        Self::insert_many(conn, project_id, service_ids).await
    }

    /// Removes every join row of a project
    pub async fn delete_for_project(conn: &mut PgConnection, project_id: i32) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project_services WHERE project_id = $1")
            .bind(project_id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected())
    }

    /// Removes every join row pointing at a service
    pub async fn delete_for_service(conn: &mut PgConnection, service_id: i32) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project_services WHERE service_id = $1")
            .bind(service_id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected())
    }

    /// Loads the services of many projects in one query, ordered by service name
    pub async fn services_for_projects<'e, E>(
        executor: E,
        project_ids: &[i32],
    ) -> Result<Vec<LinkedService>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, LinkedService>(
            r#"
            SELECT ps.project_id, s.id, s.name, s.created_at, s.updated_at
            FROM project_services ps
            JOIN services s ON s.id = ps.service_id
            WHERE ps.project_id = ANY($1)
            ORDER BY s.name ASC, s.id ASC
            "#,
        )
        .bind(project_ids)
        .fetch_all(executor)
        .await
    }
}
