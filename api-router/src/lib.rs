use api_state::ApiState;
use axum::{
    extract::{DefaultBodyLimit, FromRef},
    routing::{get, post},
    Router,
};
use routes::{compare::compare_documents, liveness::live, readiness::ready};

pub mod api_state;
pub mod error;
mod routes;

/// Router for API functionality, version 1
pub fn api_routes_v1<S>(app_state: &ApiState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    // Probes for k8s/systemd
    let probes = Router::new()
        .route("/ready", get(ready))
        .route("/live", get(live));

    let comparison = Router::new().route(
        "/compare",
        post(compare_documents).layer(DefaultBodyLimit::max(
            app_state.config.compare_max_body_bytes,
        )),
    );

    probes.merge(comparison)
}
