//! Health check endpoint for service monitoring.

use std::path::Path;

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    /// Whether the upload directory exists yet; it is created on first upload
    pub upload_dir: String,
    pub timestamp: DateTime<Utc>,
}

/// `GET /health`
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "status": "healthy",
///   "database": "connected",
///   "uploadDir": "present",
///   "timestamp": "2025-12-21T19:00:00Z"
/// }
/// ```
///
/// An unreachable database yields the standard 500 error body.
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    sqlx::query("SELECT 1").execute(&state.pool).await?;

    let upload_dir = if tokio::fs::try_exists(Path::new(&state.config.upload_dir))
        .await
        .unwrap_or(false)
    {
        "present"
    } else {
        "missing"
    };

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        database: "connected".to_string(),
        upload_dir: upload_dir.to_string(),
        timestamp: Utc::now(),
    }))
}
