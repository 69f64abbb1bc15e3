use std::sync::Arc;

use common::{
    error::AppError,
    utils::{config::AppConfig, model_loader::ModelLoader},
};
use comparison_pipeline::DocumentComparer;
use ingestion_pipeline::DocumentIngestion;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct ApiState {
    pub config: AppConfig,
    pub ingestion: Arc<DocumentIngestion>,
    pub comparer: Arc<DocumentComparer>,
    /// Held across stage, combine and compare so requests never share a staging round.
    pub job_lock: Arc<Mutex<()>>,
}

impl ApiState {
    pub async fn new(config: &AppConfig, loader: &ModelLoader) -> Result<Self, AppError> {
        let ingestion = DocumentIngestion::new(config.staging_dir()).await?;
        let comparer = DocumentComparer::new(loader)?;

        Ok(Self::from_parts(config.clone(), ingestion, comparer))
    }

    pub fn from_parts(
        config: AppConfig,
        ingestion: DocumentIngestion,
        comparer: DocumentComparer,
    ) -> Self {
        Self {
            config,
            ingestion: Arc::new(ingestion),
            comparer: Arc::new(comparer),
            job_lock: Arc::new(Mutex::new(())),
        }
    }
}
