/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Create an admin account (unless disabled)
/// - `POST /api/auth/login` - Exchange credentials for a bearer token
/// - `GET /api/auth/me` - Current admin
/// - `PUT /api/auth/profile` - Edit own name, email or password

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ValidatedJson,
    middleware::auth::AdminIdentity,
    response::ApiResponse,
};
use axum::extract::State;
use envirosite_shared::{
    auth::{jwt, password},
    models::user::{CreateUser, UpdateUser, User},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(
        custom(function = "envirosite_shared::validation::not_blank"),
        length(max = 255, message = "Full name must be at most 255 characters")
    )]
    pub full_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Checked for strength separately
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Profile update request
///
/// Changing the password requires the current one.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(
        custom(function = "envirosite_shared::validation::not_blank"),
        length(max = 255, message = "Full name must be at most 255 characters")
    )]
    pub full_name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub password: Option<String>,

    pub current_password: Option<String>,
}

/// Issued token plus the admin it belongs to
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub token: String,

    /// Always `Bearer`
    pub token_type: &'static str,

    /// Seconds until the token expires
    pub expires_in: i64,

    pub user: User,
}

/// Normalizes an email for storage and lookup
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates password strength, reporting failures on `field`
pub(crate) fn check_password(field: &str, value: &str) -> ApiResult<()> {
    password::validate_password_strength(value).map_err(|msg| ApiError::invalid_field(field, msg))
}

/// Fails with a field error if `email` belongs to another account
pub(crate) async fn ensure_email_free(
    state: &AppState,
    email: &str,
    exclude_id: Option<i32>,
) -> ApiResult<()> {
    if User::email_taken(&state.db, email, exclude_id).await? {
        return Err(ApiError::invalid_field("email", "Email is already registered"));
    }
    Ok(())
}

fn issue_token(state: &AppState, user: User) -> ApiResult<AuthPayload> {
    let lifetime = state.config.token_lifetime();
    let claims = jwt::Claims::new(user.id, user.email.clone(), lifetime);
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    Ok(AuthPayload {
        token,
        token_type: "Bearer",
        expires_in: lifetime.num_seconds(),
        user,
    })
}

/// Register a new admin
///
/// ```text
/// POST /api/auth/register
///
/// { "fullName": "Ada Green", "email": "ada@example.com", "password": "greenfield42" }
/// ```
///
/// Responds 201 with `{ token, tokenType, expiresIn, user }`.
///
/// # Errors
///
/// - `400`: invalid fields, weak password, email already registered
/// - `404`: registration is disabled
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<ApiResponse<AuthPayload>> {
    if !state.config.api.allow_registration {
        return Err(ApiError::NotFound("Registration is disabled".to_string()));
    }

    check_password("password", &req.password)?;

    let email = normalize_email(&req.email);
    ensure_email_free(&state, &email, None).await?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            full_name: req.full_name.trim().to_string(),
            email,
            password_hash,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, "Admin registered");

    Ok(ApiResponse::created("Registration successful", issue_token(&state, user)?))
}

/// Log in with email and password
///
/// # Errors
///
/// - `400`: malformed request
/// - `401`: unknown email or wrong password (same message for both)
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<ApiResponse<AuthPayload>> {
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = user.id, "Login rejected: wrong password");
        return Err(invalid());
    }

    tracing::info!(user_id = user.id, "Admin logged in");

    Ok(ApiResponse::ok("Login successful", issue_token(&state, user)?))
}

/// Returns the authenticated admin
pub async fn me(
    State(state): State<AppState>,
    admin: AdminIdentity,
) -> ApiResult<ApiResponse<User>> {
    let user = User::find_by_id(&state.db, admin.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

    Ok(ApiResponse::ok("Current admin", user))
}

/// Edits the authenticated admin's own account
///
/// # Errors
///
/// - `400`: invalid fields, email taken, weak new password, missing or wrong
///   `currentPassword` when changing the password
/// - `401`: account no longer exists
pub async fn update_profile(
    State(state): State<AppState>,
    admin: AdminIdentity,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<ApiResponse<User>> {
    let current = User::find_by_id(&state.db, admin.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

    let mut changes = UpdateUser {
        full_name: req.full_name.map(|name| name.trim().to_string()),
        ..Default::default()
    };

    if let Some(email) = req.email {
        let email = normalize_email(&email);
        ensure_email_free(&state, &email, Some(current.id)).await?;
        changes.email = Some(email);
    }

    if let Some(new_password) = req.password {
        let current_password = req.current_password.ok_or_else(|| {
            ApiError::invalid_field("currentPassword", "Current password is required to set a new one")
        })?;

        if !password::verify_password(&current_password, &current.password_hash)? {
            return Err(ApiError::invalid_field("currentPassword", "Current password is incorrect"));
        }

        check_password("password", &new_password)?;
        changes.password_hash = Some(password::hash_password(&new_password)?);
    }

    let user = User::update(&state.db, current.id, changes)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

    tracing::info!(user_id = user.id, "Profile updated");

    Ok(ApiResponse::ok("Profile updated", user))
}
