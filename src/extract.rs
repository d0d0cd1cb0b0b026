//! Request extractors that validate their payload
//!
//! Deserialization failures and `validator` rule violations both surface as
//! `AppError::BadRequest`, so every rejection uses the common error envelope.

use crate::error::AppError;
use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Form, Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON body, validated
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

        value.validate()?;
        Ok(Self(value))
    }
}

/// URL-encoded form body, validated
#[derive(Debug)]
pub struct ValidatedForm<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedForm<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(value) = Form::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

        value.validate()?;
        Ok(Self(value))
    }
}

/// Query string, validated
#[derive(Debug)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

        value.validate()?;
        Ok(Self(value))
    }
}

/// Path parameters
///
/// A segment that does not parse (`/projects/abc`) is a `BadRequest`.
#[derive(Debug)]
pub struct ValidatedPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::{CreateProjectRequest, ProjectListQuery};
    use axum::{body::Body, http::header};

    fn json_request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/projects")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_json_valid() {
        let ValidatedJson(req) =
            ValidatedJson::<CreateProjectRequest>::from_request(json_request(r#"{"name":"P1"}"#), &())
                .await
                .unwrap();
        assert_eq!(req.name, "P1");
        assert_eq!(req.description, None);
    }

    #[tokio::test]
    async fn test_json_malformed_is_bad_request() {
        let err = ValidatedJson::<CreateProjectRequest>::from_request(json_request("{"), &())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_json_rule_violation_is_bad_request() {
        let err = ValidatedJson::<CreateProjectRequest>::from_request(json_request(r#"{"name":""}"#), &())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_query_limit_out_of_range() {
        let req = Request::builder()
            .uri("/projects?limit=500")
            .body(Body::empty())
            .unwrap();
        let (mut parts, _) = req.into_parts();

        let err = ValidatedQuery::<ProjectListQuery>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_query_defaults() {
        let req = Request::builder().uri("/projects").body(Body::empty()).unwrap();
        let (mut parts, _) = req.into_parts();

        let ValidatedQuery(query) =
            ValidatedQuery::<ProjectListQuery>::from_request_parts(&mut parts, &())
                .await
                .unwrap();
        assert_eq!(query.page, 0);
        assert_eq!(query.limit, 5);
    }

    #[tokio::test]
    async fn test_path_rejection_uses_error_envelope() {
        use axum::{routing::get, Router};
        use http_body_util::BodyExt;
        use tower::ServiceExt;

        async fn show(ValidatedPath(id): ValidatedPath<i64>) -> String {
            id.to_string()
        }

        let app = Router::new().route("/items/{id}", get(show));

        let ok = app
            .clone()
            .oneshot(Request::builder().uri("/items/42").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(ok.status(), axum::http::StatusCode::OK);

        let bad = app
            .oneshot(Request::builder().uri("/items/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(bad.status(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(
            bad.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let bytes = bad.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }
}
