/// Health check endpoint
///
/// ```text
/// GET /health
/// ```
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "migrationsUpToDate": true
/// }
/// ```
///
/// Always answers 200; a failing database is reported as `degraded`.

use crate::app::AppState;
use axum::{extract::State, Json};
use envirosite_shared::db::{migrations, pool};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,

    /// Application version
    pub version: String,

    /// `connected` or `disconnected`
    pub database: String,

    /// `None` when the database is unreachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrations_up_to_date: Option<bool>,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = match pool::health_check(&state.db).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the database");
            false
        }
    };

    let migrations_up_to_date = if connected {
        migrations::get_migration_status(&state.db)
            .await
            .map(|status| status.is_up_to_date)
            .ok()
    } else {
        None
    };

    Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if connected { "connected" } else { "disconnected" }.to_string(),
        migrations_up_to_date,
    })
}
