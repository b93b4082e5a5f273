/// Bearer-token authentication for admin routes
///
/// [`require_admin`] is applied as a route layer to every mutating route and
/// to the admin-only reads. It verifies the signed JWT from the
/// `Authorization: Bearer <token>` header and stores an [`AdminIdentity`] in
/// the request extensions. Handlers take `AdminIdentity` as an extractor.
///
/// # Example
///
/// ```no_run
/// use envirosite_api::middleware::auth::AdminIdentity;
///
/// async fn handler(admin: AdminIdentity) -> String {
///     format!("Hello, admin {}", admin.user_id)
/// }
/// ```

use crate::{app::AppState, error::ApiError};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use envirosite_shared::auth::jwt;

/// The authenticated admin, taken from a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    pub user_id: i32,
    pub email: String,
}

/// Extracts the token from an `Authorization` header value
pub fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Rejects the request with 401 unless it carries a valid bearer token
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = bearer_token(header_value)
        .ok_or_else(|| ApiError::Unauthorized("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_token(token, state.jwt_secret()).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        ApiError::from(e)
    })?;

    req.extensions_mut().insert(AdminIdentity {
        user_id: claims.sub,
        email: claims.email,
    });

    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminIdentity>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
    }
}
