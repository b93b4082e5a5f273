/// Portfolio project model
///
/// Projects are client engagements shown in the public portfolio. Each one
/// offers a set of services through the `project_services` join table; reads
/// return the project together with that set ([`ProjectWithServices`]).
///
/// Writes that touch the join table take a `&mut PgConnection` so the caller
/// can run the row and its join rows in one transaction:
///
/// ```no_run
/// use envirosite_shared::models::project::{Project, ProjectInput};
/// use envirosite_shared::models::project_service::ProjectService;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let mut tx = pool.begin().await?;
/// let project = Project::create(&mut tx, &ProjectInput {
///     name: "Delta Wetland Survey".to_string(),
///     initiator: "River Authority".to_string(),
///     period: 2023,
///     photo: None,
///     description: None,
/// })
/// .await?;
/// ProjectService::insert_many(&mut tx, project.id, &[1, 2]).await?;
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id SERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     initiator VARCHAR(255) NOT NULL,
///     period INTEGER NOT NULL CHECK (period BETWEEN 2000 AND 2100),
///     photo TEXT,
///     description TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use crate::listing::{push_order_and_page, push_search, ListQuery, Page, SortOrder, SortSpec};
use crate::models::project_service::ProjectService;
use crate::models::service::Service;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor, PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;

const COLUMNS: &str = "id, name, initiator, period, photo, description, created_at, updated_at";

/// Earliest accepted project year
pub const MIN_PERIOD: i32 = 2000;

/// Latest accepted project year
pub const MAX_PERIOD: i32 = 2100;

/// Sortable columns for the project list
pub const PROJECT_SORT: SortSpec = SortSpec {
    allowed: &[
        ("id", "id"),
        ("name", "name"),
        ("initiator", "initiator"),
        ("period", "period"),
        ("createdAt", "created_at"),
    ],
    default_column: "created_at",
    default_order: SortOrder::Desc,
};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i32,
    pub name: String,
    pub initiator: String,
    /// Year the project ran, 2000..=2100
    pub period: i32,
    /// Image URL or data URI
    pub photo: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A project with its joined services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectWithServices {
    #[serde(flatten)]
    pub project: Project,
    pub services: Vec<Service>,
}

/// Column values written on create and full update
#[derive(Debug, Clone)]
pub struct ProjectInput {
    pub name: String,
    pub initiator: String,
    pub period: i32,
    pub photo: Option<String>,
    pub description: Option<String>,
}

/// Optional filters for the project list
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectFilter {
    /// Only projects offering this service
    pub service_id: Option<i32>,
}

impl Project {
    pub async fn create(conn: &mut PgConnection, data: &ProjectInput) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (name, initiator, period, photo, description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(&data.name)
        .bind(&data.initiator)
        .bind(data.period)
        .bind(&data.photo)
        .bind(&data.description)
        .fetch_one(conn)
        .await
    }

    /// Overwrites every column; `None` if the project doesn't exist
    pub async fn update(
        conn: &mut PgConnection,
        id: i32,
        data: &ProjectInput,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
            SET name = $2, initiator = $3, period = $4, photo = $5, description = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(id)
        .bind(&data.name)
        .bind(&data.initiator)
        .bind(data.period)
        .bind(&data.photo)
        .bind(&data.description)
        .fetch_optional(conn)
        .await
    }

    /// Deletes the project row; join rows must be removed first
    pub async fn delete(conn: &mut PgConnection, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Locks a project row for the rest of the transaction
    pub async fn lock(conn: &mut PgConnection, id: i32) -> Result<bool, sqlx::Error> {
        let found: Option<i32> = sqlx::query_scalar("SELECT id FROM projects WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(found.is_some())
    }

    pub async fn find_by_id<'e, E>(executor: E, id: i32) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Project>(&format!("SELECT {} FROM projects WHERE id = $1", COLUMNS))
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Finds a project and its services
    pub async fn find_with_services(
        conn: &mut PgConnection,
        id: i32,
    ) -> Result<Option<ProjectWithServices>, sqlx::Error> {
        let Some(project) = Self::find_by_id(&mut *conn, id).await? else {
            return Ok(None);
        };

        let services = ProjectService::services_for_projects(&mut *conn, &[id])
            .await?
            .into_iter()
            .map(|linked| linked.service)
            .collect();

        Ok(Some(ProjectWithServices { project, services }))
    }

    /// Lists projects with their services
    ///
    /// The search term matches name, initiator and description.
    pub async fn list(
        pool: &PgPool,
        query: &ListQuery,
        filter: ProjectFilter,
    ) -> Result<Page<ProjectWithServices>, sqlx::Error> {
        let pagination = query.pagination();
        let pattern = query.search_pattern();
        let (column, order) = query.order_by(&PROJECT_SORT);

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM projects WHERE TRUE");
        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM projects WHERE TRUE", COLUMNS));

        for qb in [&mut count, &mut select] {
            if let Some(pattern) = &pattern {
                qb.push(" AND ");
                push_search(qb, &["name", "initiator", "description"], pattern);
            }
            if let Some(service_id) = filter.service_id {
                qb.push(" AND EXISTS (SELECT 1 FROM project_services ps WHERE ps.project_id = projects.id AND ps.service_id = ")
                    .push_bind(service_id)
                    .push(")");
            }
        }

        push_order_and_page(&mut select, column, order, pagination);

        let total: i64 = count.build_query_scalar().fetch_one(pool).await?;
        let projects = select.build_query_as::<Project>().fetch_all(pool).await?;

        let ids: Vec<i32> = projects.iter().map(|p| p.id).collect();
        let mut services_by_project: HashMap<i32, Vec<Service>> = HashMap::new();
        for linked in ProjectService::services_for_projects(pool, &ids).await? {
            services_by_project
                .entry(linked.project_id)
                .or_default()
                .push(linked.service);
        }

        let items = projects
            .into_iter()
            .map(|project| {
                let services = services_by_project.remove(&project.id).unwrap_or_default();
                ProjectWithServices { project, services }
            })
            .collect();

        Ok(Page {
            items,
            meta: pagination.meta(total),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_with_services_flattens() {
        let now = Utc::now();
        let item = ProjectWithServices {
            project: Project {
                id: 9,
                name: "Coastal Survey".to_string(),
                initiator: "Port Authority".to_string(),
                period: 2022,
                photo: None,
                description: Some("Shoreline erosion study".to_string()),
                created_at: now,
                updated_at: now,
            },
            services: vec![Service {
                id: 1,
                name: "Monitoring".to_string(),
                created_at: now,
                updated_at: now,
            }],
        };

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["id"], 9);
        assert_eq!(json["initiator"], "Port Authority");
        assert_eq!(json["services"][0]["name"], "Monitoring");
        assert!(json.get("project").is_none());
    }

    #[test]
    fn test_period_bounds() {
        assert_eq!(MIN_PERIOD, 2000);
        assert_eq!(MAX_PERIOD, 2100);
    }
}
