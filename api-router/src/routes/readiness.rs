use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::warn;

use crate::api_state::ApiState;

/// Readiness probe: returns 200 if the staging directory accepts writes, else 503.
///
/// While a comparison holds the job lock the directory is in use and is not touched.
pub async fn ready(State(state): State<ApiState>) -> impl IntoResponse {
    let Ok(_job) = state.job_lock.try_lock() else {
        return (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "checks": { "staging_dir": "busy" }
            })),
        );
    };

    let probe = state
        .ingestion
        .base_dir()
        .join(format!(".ready-{}", uuid::Uuid::new_v4()));

    let result = match tokio::fs::write(&probe, b"").await {
        // Another process sharing the directory may already have removed the probe.
        Ok(()) => match tokio::fs::remove_file(&probe).await {
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        },
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "checks": { "staging_dir": "ok" }
            })),
        ),
        Err(e) => {
            warn!(error = %e, "Staging directory is not writable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "error",
                    "checks": { "staging_dir": "fail" },
                    "reason": e.to_string()
                })),
            )
        }
    }
}
