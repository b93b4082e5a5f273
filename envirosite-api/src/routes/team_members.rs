/// Team member endpoints
///
/// `displayOrder` values stay a dense `0..n-1` sequence. Every write runs in
/// one transaction: an explicit `displayOrder` moves the member there and
/// shifts the others, and deletes close the gap.
///
/// # Endpoints
///
/// - `GET /api/team-members` - List members (public)
/// - `GET /api/team-members/:id` - Get one member (public)
/// - `POST /api/team-members` - Create a member
/// - `PUT /api/team-members/:id` - Replace a member's fields
/// - `PATCH /api/team-members/:id` - Change some fields
/// - `DELETE /api/team-members/:id` - Delete and renumber
/// - `PUT /api/team-members/reorder` - Bulk display-order update

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiPath, ApiQuery, ValidatedJson},
    response::ApiResponse,
};
use axum::extract::State;
use envirosite_shared::{
    listing::ListQuery,
    models::team_member::{
        CreateTeamMember, OrderAssignment, TeamMember, TeamMemberChanges, TeamMemberFilter,
    },
};
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use validator::Validate;

/// Create/replace request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberRequest {
    #[validate(
        custom(function = "envirosite_shared::validation::not_blank"),
        length(max = 255, message = "Name must be at most 255 characters")
    )]
    pub name: String,

    #[validate(
        custom(function = "envirosite_shared::validation::not_blank"),
        length(max = 255, message = "Position must be at most 255 characters")
    )]
    pub position: String,

    pub image: Option<String>,

    #[serde(default = "default_active")]
    pub is_active: bool,

    #[validate(range(min = 0, message = "Display order must not be negative"))]
    pub display_order: Option<i32>,
}

fn default_active() -> bool {
    true
}

/// Partial update request; absent fields are left unchanged
///
/// `"image": null` clears the image.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PatchTeamMemberRequest {
    #[validate(
        custom(function = "envirosite_shared::validation::not_blank"),
        length(max = 255, message = "Name must be at most 255 characters")
    )]
    pub name: Option<String>,

    #[validate(
        custom(function = "envirosite_shared::validation::not_blank"),
        length(max = 255, message = "Position must be at most 255 characters")
    )]
    pub position: Option<String>,

    #[serde(default, deserialize_with = "present")]
    pub image: Option<Option<String>>,

    pub is_active: Option<bool>,

    #[validate(range(min = 0, message = "Display order must not be negative"))]
    pub display_order: Option<i32>,
}

/// Distinguishes an explicit `null` from a missing field
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// `{ "items": [{ "id": 3, "displayOrder": 0 }, ...] }`
#[derive(Debug, Deserialize, Validate)]
pub struct ReorderRequest {
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<OrderAssignment>,
}

/// Query parameters specific to the team list
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberListParams {
    pub is_active: Option<bool>,
}

fn member_not_found(id: i32) -> ApiError {
    ApiError::NotFound(format!("Team member {} not found", id))
}

fn clean_image(image: Option<String>) -> Option<String> {
    image.filter(|i| !i.trim().is_empty())
}

pub async fn list_team_members(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
    ApiQuery(params): ApiQuery<TeamMemberListParams>,
) -> ApiResult<ApiResponse<Vec<TeamMember>>> {
    let filter = TeamMemberFilter {
        is_active: params.is_active,
    };

    let page = TeamMember::list(&state.db, &query, filter).await?;
    Ok(ApiResponse::page("Team members retrieved", page))
}

pub async fn get_team_member(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<ApiResponse<TeamMember>> {
    let member = TeamMember::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| member_not_found(id))?;

    Ok(ApiResponse::ok("Team member retrieved", member))
}

/// Creates a member; without `displayOrder` it goes after the last one
///
/// An explicit `displayOrder` inserts it at that position, clamped to the
/// end of the list.
pub async fn create_team_member(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<TeamMemberRequest>,
) -> ApiResult<ApiResponse<TeamMember>> {
    let mut tx = state.db.begin().await?;

    let member = TeamMember::create(
        &mut tx,
        CreateTeamMember {
            name: req.name.trim().to_string(),
            position: req.position.trim().to_string(),
            image: clean_image(req.image),
            is_active: req.is_active,
            display_order: req.display_order,
        },
    )
    .await?;

    tx.commit().await?;
    tracing::info!(member_id = member.id, display_order = member.display_order, "Team member created");

    Ok(ApiResponse::created("Team member created", member))
}

/// Replaces every field; a missing `displayOrder` keeps the current one
pub async fn update_team_member(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ValidatedJson(req): ValidatedJson<TeamMemberRequest>,
) -> ApiResult<ApiResponse<TeamMember>> {
    let changes = TeamMemberChanges {
        name: Some(req.name.trim().to_string()),
        position: Some(req.position.trim().to_string()),
        image: Some(clean_image(req.image)),
        is_active: Some(req.is_active),
        display_order: req.display_order,
    };

    let mut tx = state.db.begin().await?;

    let member = TeamMember::update(&mut tx, id, changes)
        .await?
        .ok_or_else(|| member_not_found(id))?;

    tx.commit().await?;

    Ok(ApiResponse::ok("Team member updated", member))
}

/// Applies only the fields present in the body
///
/// # Errors
///
/// - `400`: empty body or invalid fields
/// - `404`: no such member
pub async fn patch_team_member(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ValidatedJson(req): ValidatedJson<PatchTeamMemberRequest>,
) -> ApiResult<ApiResponse<TeamMember>> {
    let changes = TeamMemberChanges {
        name: req.name.map(|n| n.trim().to_string()),
        position: req.position.map(|p| p.trim().to_string()),
        image: req.image.map(clean_image),
        is_active: req.is_active,
        display_order: req.display_order,
    };

    if changes.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    let mut tx = state.db.begin().await?;

    let member = TeamMember::update(&mut tx, id, changes)
        .await?
        .ok_or_else(|| member_not_found(id))?;

    tx.commit().await?;

    Ok(ApiResponse::ok("Team member updated", member))
}

/// Deletes a member and closes the gap in the display order
pub async fn delete_team_member(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<ApiResponse<()>> {
    let mut tx = state.db.begin().await?;

    if !TeamMember::delete_and_renumber(&mut tx, id).await? {
        return Err(member_not_found(id));
    }

    tx.commit().await?;
    tracing::info!(member_id = id, "Team member deleted");

    Ok(ApiResponse::message("Team member deleted"))
}

/// Moves the listed members to their `displayOrder` positions
///
/// Members not listed keep their relative order around them. Responds with
/// the full team in its new order. The whole operation is one transaction.
///
/// # Errors
///
/// - `400`: empty list, duplicate ids, negative orders
/// - `401`: missing or invalid token
/// - `404`: an id does not exist (nothing is changed)
pub async fn reorder_team_members(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ReorderRequest>,
) -> ApiResult<ApiResponse<Vec<TeamMember>>> {
    let mut seen = HashSet::with_capacity(req.items.len());
    if let Some(dup) = req.items.iter().find(|item| !seen.insert(item.id)) {
        return Err(ApiError::invalid_field(
            "items",
            format!("Team member {} is listed more than once", dup.id),
        ));
    }

    if req.items.iter().any(|item| item.display_order < 0) {
        return Err(ApiError::invalid_field("items", "Display order must not be negative"));
    }

    let ids: Vec<i32> = req.items.iter().map(|item| item.id).collect();

    let mut tx = state.db.begin().await?;

    let missing = TeamMember::missing_ids(&mut tx, &ids).await?;
    if !missing.is_empty() {
        let missing: Vec<String> = missing.iter().map(|id| id.to_string()).collect();
        return Err(ApiError::NotFound(format!(
            "Team members not found: {}",
            missing.join(", ")
        )));
    }

    let members = TeamMember::reorder(&mut tx, &req.items).await?;
    tx.commit().await?;

    tracing::info!(count = req.items.len(), "Team members reordered");

    Ok(ApiResponse::ok("Team members reordered", members))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_distinguishes_null_image() {
        let cleared: PatchTeamMemberRequest = serde_json::from_str(r#"{"image": null}"#).unwrap();
        assert_eq!(cleared.image, Some(None));

        let untouched: PatchTeamMemberRequest = serde_json::from_str(r#"{"name": "Ada"}"#).unwrap();
        assert_eq!(untouched.image, None);
    }

    #[test]
    fn test_create_defaults_to_active() {
        let req: TeamMemberRequest =
            serde_json::from_str(r#"{"name": "Ada", "position": "Ecologist"}"#).unwrap();
        assert!(req.is_active);
        assert!(req.display_order.is_none());
    }

    #[test]
    fn test_reorder_request_requires_items() {
        let req: ReorderRequest = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_blank_image_is_dropped() {
        assert_eq!(clean_image(Some(" ".to_string())), None);
        assert_eq!(clean_image(Some("a.png".to_string())), Some("a.png".to_string()));
    }
}
