//! RFC 9457 Problem Details, the error body of every Sensus endpoint.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(title = "Problem", description = "RFC 9457 Problem Details for HTTP APIs")]
pub struct Problem {
    /// URI identifying the problem type; `about:blank` when uncatalogued.
    #[serde(rename = "type")]
    pub type_url: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    /// Request path the problem occurred on.
    pub instance: String,
    /// Stable catalog code, e.g. `user_records.validation.v1`.
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ValidationError>>,
}

/// One offending input location.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(title = "ValidationError")]
pub struct ValidationError {
    pub detail: String,
    /// JSON Pointer into the request body, e.g. `/subscription/endpoint`.
    pub pointer: String,
}

impl Problem {
    pub fn new(status: StatusCode, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            type_url: "about:blank".to_owned(),
            title: title.into(),
            status: status.as_u16(),
            detail: detail.into(),
            instance: String::new(),
            code: String::new(),
            trace_id: None,
            errors: None,
        }
    }

    /// Problem titled with the status' canonical reason phrase.
    pub fn from_status(status: StatusCode, detail: impl Into<String>) -> Self {
        Self::new(status, status.canonical_reason().unwrap_or("Error"), detail)
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn with_type(mut self, type_url: impl Into<String>) -> Self {
        self.type_url = type_url.into();
        self
    }

    pub fn with_instance(mut self, uri: impl Into<String>) -> Self {
        self.instance = uri.into();
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_trace_id(mut self, id: Option<String>) -> Self {
        self.trace_id = id;
        self
    }

    /// Append a field error; `pointer` is a JSON Pointer.
    pub fn with_field_error(mut self, pointer: impl Into<String>, detail: impl Into<String>) -> Self {
        self.errors.get_or_insert_with(Vec::new).push(ValidationError {
            detail: detail.into(),
            pointer: pointer.into(),
        });
        self
    }
}

/// `IntoResponse` wrapper: status from the problem, `application/problem+json` body.
#[derive(Debug, Clone)]
pub struct ProblemResponse(pub Problem);

impl From<Problem> for ProblemResponse {
    fn from(p: Problem) -> Self {
        Self(p)
    }
}

impl IntoResponse for ProblemResponse {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        (
            status,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static(APPLICATION_PROBLEM_JSON),
            )],
            Json(self.0),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_has_problem_content_type() {
        let resp = ProblemResponse(Problem::from_status(StatusCode::BAD_REQUEST, "bad body"))
            .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            APPLICATION_PROBLEM_JSON
        );
    }

    #[test]
    fn field_errors_accumulate() {
        let p = Problem::from_status(StatusCode::UNSUPPORTED_MEDIA_TYPE, "not a PNG or JPEG image")
            .with_code("user_records.asset.invalid_format.v1")
            .with_instance("/screen_peek/Jordan")
            .with_trace_id(Some("42".into()))
            .with_field_error("/screenshot", "unrecognized image data")
            .with_field_error("/url", "too long");

        assert_eq!(p.title, "Unsupported Media Type");
        assert_eq!(p.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(p.trace_id.as_deref(), Some("42"));
        assert_eq!(p.errors.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn optional_members_are_omitted() {
        let v = serde_json::to_value(Problem::from_status(StatusCode::NOT_FOUND, "gone")).unwrap();
        assert_eq!(v["type"], "about:blank");
        assert_eq!(v["title"], "Not Found");
        assert_eq!(v["status"], 404);
        assert!(v.get("trace_id").is_none());
        assert!(v.get("errors").is_none());
    }

    #[test]
    fn unknown_status_renders_as_500() {
        let mut p = Problem::from_status(StatusCode::OK, "");
        p.status = 1000;
        assert_eq!(p.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
