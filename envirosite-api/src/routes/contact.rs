/// Public contact form
///
/// ```text
/// POST /api/contact
///
/// {
///   "name": "Jane Visitor",
///   "email": "jane@example.org",
///   "phone": "+1 555 0100",
///   "serviceId": 2,
///   "message": "We need a baseline survey."
/// }
/// ```
///
/// Every admin receives one notification. Mail is sent sequentially and is
/// not transactional: a failure part-way leaves earlier messages sent, and a
/// retried request sends everything again.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ValidatedJson,
    response::ApiResponse,
};
use axum::extract::State;
use envirosite_shared::{
    mail::{contact_notification, ContactMessage},
    models::{service::Service, user::User},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    #[validate(
        custom(function = "envirosite_shared::validation::not_blank"),
        length(max = 255, message = "Name must be at most 255 characters")
    )]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(max = 50, message = "Phone must be at most 50 characters"))]
    pub phone: Option<String>,

    pub service_id: i32,

    #[validate(
        custom(function = "envirosite_shared::validation::not_blank"),
        length(max = 5000, message = "Message must be at most 5000 characters")
    )]
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResult {
    /// Notifications handed to the mailer
    pub sent: usize,
}

/// Handles a contact submission
///
/// # Errors
///
/// - `400`: invalid fields
/// - `404`: `serviceId` names no service
/// - `500`: the mailer failed
pub async fn submit_contact(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ContactRequest>,
) -> ApiResult<ApiResponse<ContactResult>> {
    let service = Service::find_by_id(&state.db, req.service_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Service {} not found", req.service_id)))?;

    let contact = ContactMessage {
        name: req.name.trim().to_string(),
        email: req.email.trim().to_string(),
        phone: req.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
        service_name: service.name,
        message: req.message.trim().to_string(),
    };

    let admins = User::all(&state.db).await?;

    let mut sent = 0;
    for admin in &admins {
        let mail = contact_notification(&admin.full_name, &admin.email, &contact);
        state.mailer.send(&mail).await?;
        sent += 1;
    }

    tracing::info!(service_id = req.service_id, sent, "Contact message delivered");

    Ok(ApiResponse::ok(
        "Your message has been sent",
        ContactResult { sent },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_request_validation() {
        let req: ContactRequest = serde_json::from_str(
            r#"{"name": "Jane", "email": "jane@", "serviceId": 1, "message": ""}"#,
        )
        .unwrap();

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("message"));
        assert!(!fields.contains_key("name"));
    }
}
