use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Overrides the staging directory, otherwise `{data_dir}/document_compare`.
    #[serde(default)]
    pub staging_dir: Option<String>,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_model_config_path")]
    pub model_config_path: String,
    #[serde(default = "default_compare_max_body_bytes")]
    pub compare_max_body_bytes: usize,
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_model_config_path() -> String {
    "config/models.yaml".to_string()
}

fn default_compare_max_body_bytes() -> usize {
    50_000_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            staging_dir: None,
            http_port: default_http_port(),
            model_config_path: default_model_config_path(),
            compare_max_body_bytes: default_compare_max_body_bytes(),
        }
    }
}

impl AppConfig {
    pub fn staging_dir(&self) -> PathBuf {
        self.staging_dir.as_ref().map_or_else(
            || PathBuf::from(&self.data_dir).join("document_compare"),
            PathBuf::from,
        )
    }
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staging_dir_defaults_under_data_dir() {
        let config = AppConfig {
            data_dir: "/srv/docdiff".into(),
            ..Default::default()
        };

        assert_eq!(
            config.staging_dir(),
            PathBuf::from("/srv/docdiff/document_compare")
        );
    }

    #[test]
    fn explicit_staging_dir_wins() {
        let config = AppConfig {
            staging_dir: Some("/tmp/staging".into()),
            ..Default::default()
        };

        assert_eq!(config.staging_dir(), PathBuf::from("/tmp/staging"));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(
                "http_port = 9000",
                config::FileFormat::Toml,
            ))
            .build()
            .expect("build config")
            .try_deserialize()
            .expect("deserialize");

        assert_eq!(config.http_port, 9000);
        assert_eq!(config.data_dir, "./data");
        assert_eq!(config.model_config_path, "config/models.yaml");
        assert!(config.staging_dir.is_none());
    }
}
