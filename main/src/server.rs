use api_router::{api_routes_v1, api_state::ApiState};
use axum::Router;
use common::utils::{config::get_config, model_loader::ProviderEnv};
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    docdiff::init_tracing();

    // Get config
    let config = get_config()?;
    let loader = docdiff::load_models(&config, ProviderEnv::from_process())?;

    let api_state = ApiState::new(&config, &loader).await?;
    info!(
        staging_dir = %api_state.ingestion.base_dir().display(),
        "Staging directory ready"
    );

    // Create Axum router
    let app = Router::new()
        .nest("/api/v1", api_routes_v1(&api_state))
        .layer(TraceLayer::new_for_http())
        .with_state(api_state);

    info!("Starting server listening on 0.0.0.0:{}", config.http_port);
    let serve_address = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(serve_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
