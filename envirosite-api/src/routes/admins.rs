/// Admin account management
///
/// All routes require a bearer token. Password hashes never leave the
/// server; `User` skips them when serialized.
///
/// # Endpoints
///
/// - `GET /api/admins` - List admins (search on full name and email)
/// - `GET /api/admins/:id` - Get one admin
/// - `POST /api/admins` - Create an admin
/// - `PUT /api/admins/:id` - Update an admin (password optional)
/// - `DELETE /api/admins/:id` - Delete an admin (not yourself)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiPath, ApiQuery, ValidatedJson},
    middleware::auth::AdminIdentity,
    response::ApiResponse,
    routes::auth::{check_password, ensure_email_free, normalize_email},
};
use axum::extract::State;
use envirosite_shared::{
    auth::password,
    listing::ListQuery,
    models::user::{CreateUser, UpdateUser, User},
};
use serde::Deserialize;
use validator::Validate;

/// Create admin request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminRequest {
    #[validate(
        custom(function = "envirosite_shared::validation::not_blank"),
        length(max = 255, message = "Full name must be at most 255 characters")
    )]
    pub full_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Update admin request
///
/// Name and email are required; the password is re-hashed only when present.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAdminRequest {
    #[validate(
        custom(function = "envirosite_shared::validation::not_blank"),
        length(max = 255, message = "Full name must be at most 255 characters")
    )]
    pub full_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: Option<String>,
}

fn admin_not_found(id: i32) -> ApiError {
    ApiError::NotFound(format!("Admin {} not found", id))
}

pub async fn list_admins(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<ApiResponse<Vec<User>>> {
    let page = User::list(&state.db, &query).await?;
    Ok(ApiResponse::page("Admins retrieved", page))
}

pub async fn get_admin(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<ApiResponse<User>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| admin_not_found(id))?;

    Ok(ApiResponse::ok("Admin retrieved", user))
}

/// Creates an admin
///
/// # Errors
///
/// - `400`: invalid fields, weak password, email already registered
pub async fn create_admin(
    State(state): State<AppState>,
    admin: AdminIdentity,
    ValidatedJson(req): ValidatedJson<CreateAdminRequest>,
) -> ApiResult<ApiResponse<User>> {
    check_password("password", &req.password)?;

    let email = normalize_email(&req.email);
    ensure_email_free(&state, &email, None).await?;

    let user = User::create(
        &state.db,
        CreateUser {
            full_name: req.full_name.trim().to_string(),
            email,
            password_hash: password::hash_password(&req.password)?,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, created_by = admin.user_id, "Admin created");

    Ok(ApiResponse::created("Admin created", user))
}

pub async fn update_admin(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ValidatedJson(req): ValidatedJson<UpdateAdminRequest>,
) -> ApiResult<ApiResponse<User>> {
    if User::find_by_id(&state.db, id).await?.is_none() {
        return Err(admin_not_found(id));
    }

    let email = normalize_email(&req.email);
    ensure_email_free(&state, &email, Some(id)).await?;

    let password_hash = match req.password.as_deref() {
        Some(new_password) => {
            check_password("password", new_password)?;
            Some(password::hash_password(new_password)?)
        }
        None => None,
    };

    let user = User::update(
        &state.db,
        id,
        UpdateUser {
            full_name: Some(req.full_name.trim().to_string()),
            email: Some(email),
            password_hash,
        },
    )
    .await?
    .ok_or_else(|| admin_not_found(id))?;

    Ok(ApiResponse::ok("Admin updated", user))
}

/// Deletes an admin
///
/// # Errors
///
/// - `400`: the caller tried to delete their own account
/// - `404`: no such admin
pub async fn delete_admin(
    State(state): State<AppState>,
    admin: AdminIdentity,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<ApiResponse<()>> {
    if admin.user_id == id {
        return Err(ApiError::BadRequest("You cannot delete your own account".to_string()));
    }

    if !User::delete(&state.db, id).await? {
        return Err(admin_not_found(id));
    }

    tracing::info!(user_id = id, deleted_by = admin.user_id, "Admin deleted");

    Ok(ApiResponse::message("Admin deleted"))
}
