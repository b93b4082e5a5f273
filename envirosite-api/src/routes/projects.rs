/// Portfolio project endpoints
///
/// Writes run in one transaction each: the submitted service ids are checked
/// against the `services` table, then the project row and its join rows are
/// written. Any failure drops the transaction, which rolls it back.
///
/// # Endpoints
///
/// - `GET /api/projects` - List projects with their services (public)
/// - `GET /api/projects/:id` - Get one project (public)
/// - `POST /api/projects` - Create a project
/// - `PUT /api/projects/:id` - Replace a project and its service set
/// - `DELETE /api/projects/:id` - Delete a project and its join rows

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiPath, ApiQuery, ValidatedJson},
    response::ApiResponse,
};
use axum::extract::State;
use envirosite_shared::{
    listing::ListQuery,
    models::{
        project::{Project, ProjectFilter, ProjectInput, ProjectWithServices},
        project_service::ProjectService,
        service::Service,
    },
    validation::dedup_ids,
};
use serde::Deserialize;
use sqlx::PgConnection;
use validator::Validate;

/// Create/replace project request
///
/// ```json
/// {
///   "name": "Coastal Survey",
///   "initiator": "Port Authority",
///   "period": 2022,
///   "photo": "https://cdn.example.com/coast.jpg",
///   "description": "Shoreline erosion study",
///   "services": [1, 3]
/// }
/// ```
#[derive(Debug, Deserialize, Validate)]
pub struct ProjectRequest {
    #[validate(
        custom(function = "envirosite_shared::validation::not_blank"),
        length(max = 255, message = "Name must be at most 255 characters")
    )]
    pub name: String,

    #[validate(
        custom(function = "envirosite_shared::validation::not_blank"),
        length(max = 255, message = "Initiator must be at most 255 characters")
    )]
    pub initiator: String,

    #[validate(range(min = 2000, max = 2100, message = "Period must be between 2000 and 2100"))]
    pub period: i32,

    pub photo: Option<String>,

    pub description: Option<String>,

    /// Service ids; duplicates are collapsed
    #[validate(length(min = 1, message = "At least one service is required"))]
    pub services: Vec<i32>,
}

impl ProjectRequest {
    fn input(&self) -> ProjectInput {
        ProjectInput {
            name: self.name.trim().to_string(),
            initiator: self.initiator.trim().to_string(),
            period: self.period,
            photo: self.photo.clone().filter(|p| !p.trim().is_empty()),
            description: self.description.clone(),
        }
    }
}

/// Query parameters specific to the project list
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectListParams {
    pub service_id: Option<i32>,
}

fn project_not_found(id: i32) -> ApiError {
    ApiError::NotFound(format!("Project {} not found", id))
}

/// Verifies every id names an existing service
///
/// Runs inside the caller's transaction; the matched service rows stay locked
/// until it ends.
async fn check_services(conn: &mut PgConnection, ids: &[i32]) -> ApiResult<()> {
    let found = Service::existing_ids(conn, ids).await?;
    let missing: Vec<String> = ids
        .iter()
        .filter(|id| !found.contains(id))
        .map(|id| id.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(ApiError::invalid_field(
            "services",
            format!("Unknown service ids: {}", missing.join(", ")),
        ));
    }
    Ok(())
}

/// Re-reads a project with its services for the response
async fn reload(conn: &mut PgConnection, id: i32) -> ApiResult<ProjectWithServices> {
    Project::find_with_services(conn, id)
        .await?
        .ok_or_else(|| project_not_found(id))
}

pub async fn list_projects(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
    ApiQuery(params): ApiQuery<ProjectListParams>,
) -> ApiResult<ApiResponse<Vec<ProjectWithServices>>> {
    let filter = ProjectFilter {
        service_id: params.service_id,
    };

    let page = Project::list(&state.db, &query, filter).await?;
    Ok(ApiResponse::page("Projects retrieved", page))
}

pub async fn get_project(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<ApiResponse<ProjectWithServices>> {
    let mut conn = state.db.acquire().await?;
    let project = reload(&mut conn, id).await?;

    Ok(ApiResponse::ok("Project retrieved", project))
}

/// Creates a project with its services
///
/// # Errors
///
/// - `400`: invalid fields, period outside 2000..=2100, empty or unknown service ids
pub async fn create_project(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ProjectRequest>,
) -> ApiResult<ApiResponse<ProjectWithServices>> {
    let service_ids = dedup_ids(&req.services);

    let mut tx = state.db.begin().await?;

    check_services(&mut tx, &service_ids).await?;
    let project = Project::create(&mut tx, &req.input()).await?;
    ProjectService::insert_many(&mut tx, project.id, &service_ids).await?;

    tx.commit().await?;

    tracing::info!(project_id = project.id, services = service_ids.len(), "Project created");

    let mut conn = state.db.acquire().await?;
    let created = reload(&mut conn, project.id).await?;

    Ok(ApiResponse::created("Project created", created))
}

/// Replaces a project's fields and service set
///
/// # Errors
///
/// - `400`: same as create
/// - `404`: no such project
pub async fn update_project(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ValidatedJson(req): ValidatedJson<ProjectRequest>,
) -> ApiResult<ApiResponse<ProjectWithServices>> {
    let service_ids = dedup_ids(&req.services);

    let mut tx = state.db.begin().await?;

    if !Project::lock(&mut tx, id).await? {
        return Err(project_not_found(id));
    }

    check_services(&mut tx, &service_ids).await?;
    Project::update(&mut tx, id, &req.input())
        .await?
        .ok_or_else(|| project_not_found(id))?;
    ProjectService::replace_for_project(&mut tx, id, &service_ids).await?;

    let updated = reload(&mut tx, id).await?;
    tx.commit().await?;

    tracing::info!(project_id = id, services = service_ids.len(), "Project updated");

    Ok(ApiResponse::ok("Project updated", updated))
}

/// Deletes a project: join rows first, then the project row
pub async fn delete_project(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<ApiResponse<()>> {
    let mut tx = state.db.begin().await?;

    if !Project::lock(&mut tx, id).await? {
        return Err(project_not_found(id));
    }

    ProjectService::delete_for_project(&mut tx, id).await?;
    Project::delete(&mut tx, id).await?;

    tx.commit().await?;
    tracing::info!(project_id = id, "Project deleted");

    Ok(ApiResponse::message("Project deleted"))
}
