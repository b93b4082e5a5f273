/// Request extractors
///
/// [`ValidatedJson`] parses a JSON body and runs its `validator` rules.
/// [`ApiQuery`] and [`ApiPath`] wrap axum's `Query` and `Path`. Malformed
/// bodies, query strings and path segments all become 400 responses in the
/// standard error envelope instead of axum's plain-text rejections.

use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, Request,
    },
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON body that has passed validation
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;

        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::BadRequest("Expected a JSON request body".to_string())
        }
        other => ApiError::BadRequest(format!("Invalid request body: {}", other.body_text())),
    }
}

/// Query string deserialized into `T`
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(query_rejection)?;
        Ok(ApiQuery(value))
    }
}

fn query_rejection(rejection: QueryRejection) -> ApiError {
    ApiError::BadRequest(format!("Invalid query parameters: {}", rejection.body_text()))
}

/// Path parameters deserialized into `T`
#[derive(Debug, Clone, Copy)]
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(path_rejection)?;
        Ok(ApiPath(value))
    }
}

fn path_rejection(rejection: PathRejection) -> ApiError {
    match rejection {
        PathRejection::FailedToDeserializePathParams(_) => {
            ApiError::BadRequest("Invalid id in request path".to_string())
        }
        other => ApiError::InternalError(format!("Path extraction failed: {}", other.body_text())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::header};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Payload {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
    }

    fn request(content_type: Option<&str>, body: &str) -> Request {
        let mut builder = axum::http::Request::builder().method("POST").uri("/");
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_valid_body() {
        let ValidatedJson(payload) =
            ValidatedJson::<Payload>::from_request(request(Some("application/json"), r#"{"name":"Soil"}"#), &())
                .await
                .unwrap();
        assert_eq!(payload.name, "Soil");
    }

    #[tokio::test]
    async fn test_invalid_field() {
        let err = ValidatedJson::<Payload>::from_request(request(Some("application/json"), r#"{"name":""}"#), &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(ref details) if details[0].field == "name"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let err = ValidatedJson::<Payload>::from_request(request(Some("application/json"), "{oops"), &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_missing_content_type() {
        let err = ValidatedJson::<Payload>::from_request(request(None, r#"{"name":"x"}"#), &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(ref msg) if msg.contains("JSON")));
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Params {
        page: Option<u32>,
        is_active: Option<bool>,
    }

    fn parts(uri: &str) -> Parts {
        let (parts, _) = axum::http::Request::builder()
            .uri(uri)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[tokio::test]
    async fn test_query_parses() {
        let ApiQuery(params) = ApiQuery::<Params>::from_request_parts(&mut parts("/?page=2&isActive=false"), &())
            .await
            .unwrap();
        assert_eq!(params.page, Some(2));
        assert_eq!(params.is_active, Some(false));
    }

    #[tokio::test]
    async fn test_malformed_query_is_bad_request() {
        for uri in ["/?page=abc", "/?isActive=yes"] {
            let err = ApiQuery::<Params>::from_request_parts(&mut parts(uri), &())
                .await
                .unwrap_err();
            assert!(matches!(err, ApiError::BadRequest(ref msg) if msg.starts_with("Invalid query parameters")));
        }
    }
}
