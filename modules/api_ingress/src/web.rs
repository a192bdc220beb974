use axum::response::{Html, Json};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct LivenessDto {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthDto {
    pub status: String,
    /// RFC 3339
    pub timestamp: String,
}

/// Liveness marker
#[utoipa::path(
    get,
    path = "/",
    tag = "system",
    responses((status = 200, description = "Server is up", body = LivenessDto))
)]
pub async fn liveness() -> Json<LivenessDto> {
    Json(LivenessDto {
        message: "Sensus API is running".to_string(),
    })
}

/// Health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses((status = 200, description = "Server is healthy", body = HealthDto))
)]
pub async fn health_check() -> Json<HealthDto> {
    Json(HealthDto {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn serve_docs() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8"/>
  <title>Sensus API Docs</title>
  <script src="https://unpkg.com/@stoplight/elements@latest/web-components.min.js"></script>
  <link rel="stylesheet" href="https://unpkg.com/@stoplight/elements@latest/styles.min.css">
</head>
<body>
  <elements-api apiDescriptionUrl="/openapi.json" router="hash" layout="sidebar"></elements-api>
</body>
</html>"#,
    )
}
