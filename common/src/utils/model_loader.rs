use std::{
    collections::{BTreeMap, HashMap},
    path::Path,
};

use config::{Config, File, FileFormat};
use serde::Deserialize;
use tracing::{error, info};

use crate::{
    error::AppError,
    utils::llm::{EmbeddingClient, LlmClient, LlmProvider},
};

pub const GROQ_API_KEY: &str = "GROQ_API_KEY";
pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
pub const LLM_PROVIDER: &str = "LLM_PROVIDER";
pub const DEFAULT_PROVIDER_KEY: &str = "groq";

const REQUIRED_ENV_VARS: [&str; 2] = [GROQ_API_KEY, GOOGLE_API_KEY];

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EmbeddingModelConfig {
    pub model_name: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LlmBlock {
    pub provider: String,
    pub model_name: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_output_tokens() -> u32 {
    2048
}

/// Provider configuration, keyed by the selector read from `LLM_PROVIDER`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModelConfig {
    pub embedding_model: EmbeddingModelConfig,
    pub llm: BTreeMap<String, LlmBlock>,
}

impl ModelConfig {
    /// Loads and validates the model configuration from a file in any format the
    /// `config` crate understands (format inferred from the extension).
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let config: Self = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str, format: FileFormat) -> Result<Self, AppError> {
        let config: Self = Config::builder()
            .add_source(File::from_str(content, format))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.embedding_model.model_name.trim().is_empty() {
            return Err(AppError::Configuration(
                "embedding_model.model_name must not be empty".into(),
            ));
        }

        if self.llm.is_empty() {
            return Err(AppError::Configuration(
                "llm must contain at least one provider block".into(),
            ));
        }

        for (key, block) in &self.llm {
            if block.provider.trim().is_empty() {
                return Err(AppError::Configuration(format!(
                    "llm.{key}.provider must not be empty"
                )));
            }
            if block.model_name.trim().is_empty() {
                return Err(AppError::Configuration(format!(
                    "llm.{key}.model_name must not be empty"
                )));
            }
        }

        Ok(())
    }
}

/// Snapshot of the environment variables the loader cares about, taken once.
#[derive(Debug, Clone, Default)]
pub struct ProviderEnv {
    vars: HashMap<String, String>,
}

impl ProviderEnv {
    /// Reads `.env` (if present) and then the process environment.
    pub fn from_process() -> Self {
        dotenvy::dotenv().ok();

        let vars = REQUIRED_ENV_VARS
            .iter()
            .chain(std::iter::once(&LLM_PROVIDER))
            .filter_map(|key| std::env::var(key).ok().map(|value| ((*key).to_string(), value)))
            .collect();

        Self { vars }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

/// Builds LLM and embedding clients from validated configuration.
///
/// Construction checks credentials once; afterwards the loader is immutable and
/// every `load_*` call hands out a fresh client.
#[derive(Debug, Clone)]
pub struct ModelLoader {
    config: ModelConfig,
    env: ProviderEnv,
}

impl ModelLoader {
    pub fn new(config: ModelConfig, env: ProviderEnv) -> Result<Self, AppError> {
        let missing: Vec<&str> = REQUIRED_ENV_VARS
            .iter()
            .copied()
            .filter(|key| env.get(key).is_none())
            .collect();

        if !missing.is_empty() {
            error!(missing_vars = ?missing, "Missing environment variables");
            return Err(AppError::Configuration(format!(
                "Missing environment variables: {}",
                missing.join(", ")
            )));
        }

        config.validate()?;

        info!(
            available_keys = ?REQUIRED_ENV_VARS
                .iter()
                .filter(|key| env.get(key).is_some_and(|value| !value.is_empty()))
                .collect::<Vec<_>>(),
            llm_blocks = ?config.llm.keys().collect::<Vec<_>>(),
            "Model loader initialized"
        );

        Ok(Self { config, env })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// The `llm` block key selected by `LLM_PROVIDER`.
    pub fn provider_key(&self) -> &str {
        self.env.get(LLM_PROVIDER).unwrap_or(DEFAULT_PROVIDER_KEY)
    }

    pub fn load_llm(&self) -> Result<LlmClient, AppError> {
        let provider_key = self.provider_key();

        let Some(block) = self.config.llm.get(provider_key) else {
            error!(provider_key, "LLM provider not found in config");
            return Err(AppError::Configuration(format!(
                "Provider '{provider_key}' not found in config"
            )));
        };

        let provider: LlmProvider = block.provider.parse().map_err(|err| {
            error!(provider = %block.provider, "Unsupported LLM provider");
            err
        })?;

        info!(
            provider = %provider,
            model = %block.model_name,
            temperature = block.temperature,
            max_tokens = block.max_output_tokens,
            "Loading LLM"
        );

        let api_key = self.api_key(provider.api_key_var())?;
        let max_output_tokens = match provider {
            LlmProvider::Google => Some(block.max_output_tokens),
            LlmProvider::Groq => None,
        };

        Ok(LlmClient::new(
            provider,
            api_key,
            &block.model_name,
            block.temperature,
            max_output_tokens,
        ))
    }

    pub fn load_embeddings(&self) -> Result<EmbeddingClient, AppError> {
        info!(model = %self.config.embedding_model.model_name, "Loading embedding model");

        let api_key = self.api_key(GOOGLE_API_KEY).map_err(|err| {
            error!(error = %err, "Error loading embedding model");
            AppError::ModelLoad(format!("Failed to load embedding model: {err}"))
        })?;

        if api_key.trim().is_empty() {
            error!("Error loading embedding model: empty API key");
            return Err(AppError::ModelLoad(format!(
                "Failed to load embedding model: {GOOGLE_API_KEY} is empty"
            )));
        }

        Ok(EmbeddingClient::new(
            LlmProvider::Google,
            api_key,
            &self.config.embedding_model.model_name,
        ))
    }

    fn api_key(&self, key: &str) -> Result<&str, AppError> {
        self.env
            .get(key)
            .ok_or_else(|| AppError::Configuration(format!("Missing environment variables: {key}")))
    }
}
