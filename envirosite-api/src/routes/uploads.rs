/// Image upload configuration
///
/// Images are uploaded by the browser straight to an external service; the
/// API only stores the resulting URL. This endpoint tells the admin UI where
/// to upload and how long to wait.
///
/// ```text
/// GET /api/uploads/config
/// ```
///
/// ```json
/// { "success": true, "message": "Upload configuration",
///   "data": { "endpoint": "https://upload.example.com/images", "timeoutMs": 30000 } }
/// ```

use crate::{app::AppState, response::ApiResponse};
use axum::extract::State;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadConfigResponse {
    /// `null` when uploads are not configured
    pub endpoint: Option<String>,
    pub timeout_ms: u64,
}

pub async fn upload_config(State(state): State<AppState>) -> ApiResponse<UploadConfigResponse> {
    let upload = &state.config.upload;

    ApiResponse::ok(
        "Upload configuration",
        UploadConfigResponse {
            endpoint: upload.endpoint_url.clone(),
            timeout_ms: upload.timeout_ms,
        },
    )
}
