/// Consulting service endpoints
///
/// # Endpoints
///
/// - `GET /api/services` - List services (public)
/// - `GET /api/services/:id` - Get one service (public)
/// - `POST /api/services` - Create a service
/// - `PUT /api/services/:id` - Rename a service
/// - `DELETE /api/services/:id` - Delete a service and its project links

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiPath, ApiQuery, ValidatedJson},
    response::ApiResponse,
};
use axum::extract::State;
use envirosite_shared::{
    listing::ListQuery,
    models::{project_service::ProjectService, service::Service},
};
use serde::Deserialize;
use validator::Validate;

/// Create/update service request
#[derive(Debug, Deserialize, Validate)]
pub struct ServiceRequest {
    #[validate(
        custom(function = "envirosite_shared::validation::not_blank"),
        length(max = 255, message = "Name must be at most 255 characters")
    )]
    pub name: String,
}

fn service_not_found(id: i32) -> ApiError {
    ApiError::NotFound(format!("Service {} not found", id))
}

async fn ensure_name_free(state: &AppState, name: &str, exclude_id: Option<i32>) -> ApiResult<()> {
    if Service::name_taken(&state.db, name, exclude_id).await? {
        return Err(ApiError::invalid_field(
            "name",
            "A service with this name already exists",
        ));
    }
    Ok(())
}

pub async fn list_services(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<ApiResponse<Vec<Service>>> {
    let page = Service::list(&state.db, &query).await?;
    Ok(ApiResponse::page("Services retrieved", page))
}

pub async fn get_service(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<ApiResponse<Service>> {
    let service = Service::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| service_not_found(id))?;

    Ok(ApiResponse::ok("Service retrieved", service))
}

/// Creates a service
///
/// # Errors
///
/// - `400`: blank name, or the name is taken (case-insensitive)
pub async fn create_service(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ServiceRequest>,
) -> ApiResult<ApiResponse<Service>> {
    let name = req.name.trim();
    ensure_name_free(&state, name, None).await?;

    let service = Service::create(&state.db, name).await?;
    tracing::info!(service_id = service.id, "Service created");

    Ok(ApiResponse::created("Service created", service))
}

pub async fn update_service(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ValidatedJson(req): ValidatedJson<ServiceRequest>,
) -> ApiResult<ApiResponse<Service>> {
    let name = req.name.trim();
    ensure_name_free(&state, name, Some(id)).await?;

    let service = Service::update(&state.db, id, name)
        .await?
        .ok_or_else(|| service_not_found(id))?;

    Ok(ApiResponse::ok("Service updated", service))
}

/// Deletes a service
///
/// Join rows go first, then the service, in one transaction. Projects that
/// offered the service keep existing without it.
pub async fn delete_service(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<ApiResponse<()>> {
    let mut tx = state.db.begin().await?;

    let unlinked = ProjectService::delete_for_service(&mut tx, id).await?;

    if !Service::delete(&mut tx, id).await? {
        return Err(service_not_found(id));
    }

    tx.commit().await?;
    tracing::info!(service_id = id, unlinked_projects = unlinked, "Service deleted");

    Ok(ApiResponse::message("Service deleted"))
}
