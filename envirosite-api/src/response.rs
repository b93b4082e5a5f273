/// Success envelope
///
/// Every successful response has the shape
/// `{ "success": true, "message": "...", "data": ..., "metadata": ... }`;
/// `data` and `metadata` are omitted when absent.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use envirosite_shared::listing::{Page, PageMeta};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PageMeta>,

    #[serde(skip)]
    status: StatusCode,
}

impl<T> ApiResponse<T> {
    /// 200 with a payload
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            metadata: None,
            status: StatusCode::OK,
        }
    }

    /// 201 with the created resource
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::ok(message, data)
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// 200 with one page of a listing
    pub fn page(message: impl Into<String>, page: Page<T>) -> Self {
        Self {
            metadata: Some(page.meta),
            ..Self::ok(message, page.items)
        }
    }
}

impl ApiResponse<()> {
    /// 200 with only a message
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            metadata: None,
            status: StatusCode::OK,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use envirosite_shared::listing::Pagination;

    #[test]
    fn test_message_only_omits_data() {
        let json = serde_json::to_value(ApiResponse::message("Deleted")).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true, "message": "Deleted" }));
    }

    #[test]
    fn test_page_carries_metadata() {
        let page = Page {
            items: vec![1, 2, 3],
            meta: Pagination::new(Some(2), Some(3)).meta(7),
        };

        let json = serde_json::to_value(ApiResponse::page("Listed", page)).unwrap();
        assert_eq!(json["data"], serde_json::json!([1, 2, 3]));
        assert_eq!(json["metadata"]["total"], 7);
        assert_eq!(json["metadata"]["page"], 2);
        assert_eq!(json["metadata"]["perPage"], 3);
        assert_eq!(json["metadata"]["totalPages"], 3);
    }

    #[test]
    fn test_created_status() {
        let response = ApiResponse::created("Created", 1).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
