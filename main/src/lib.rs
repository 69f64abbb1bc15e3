//! Startup wiring shared by the `server` and `compare` binaries.

use std::path::Path;

use common::{
    error::AppError,
    utils::{
        config::AppConfig,
        model_loader::{ModelConfig, ModelLoader, ProviderEnv},
    },
};
use comparison_pipeline::{ComparisonTable, DocumentComparer};
use ingestion_pipeline::{DocumentIngestion, UploadedFile};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();
}

/// Reads the provider configuration named by `config.model_config_path` and
/// checks it against the given environment snapshot.
pub fn load_models(config: &AppConfig, env: ProviderEnv) -> Result<ModelLoader, AppError> {
    let model_config = ModelConfig::load(Path::new(&config.model_config_path))?;
    let loader = ModelLoader::new(model_config, env)?;
    info!(
        path = %config.model_config_path,
        provider_key = loader.provider_key(),
        "Model configuration loaded"
    );
    Ok(loader)
}

pub async fn upload_from_path(path: &Path) -> Result<UploadedFile, AppError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| AppError::Validation(format!("Not a file path: {}", path.display())))?;
    let bytes = tokio::fs::read(path).await?;

    Ok(UploadedFile::new(file_name, bytes))
}

/// One full comparison: stage, combine, compare.
pub async fn run_comparison(
    ingestion: &DocumentIngestion,
    comparer: &DocumentComparer,
    reference: UploadedFile,
    actual: UploadedFile,
) -> Result<ComparisonTable, AppError> {
    ingestion.stage(reference, actual).await?;
    let combined = ingestion.combine().await?;
    comparer.compare(&combined).await
}
