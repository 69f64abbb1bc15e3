use async_openai::error::OpenAIError;
use thiserror::Error;
use tokio::task::JoinError;

// Core internal errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),
    #[error("Staging error: {context}: {source}")]
    Staging {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Document is encrypted: {0}")]
    Encrypted(String),
    #[error("PDF read error: {0}")]
    PdfRead(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Model load error: {0}")]
    ModelLoad(String),
    #[error("Comparison error: {context}: {source}")]
    Comparison {
        context: String,
        #[source]
        source: Box<AppError>,
    },
    #[error("LLM parsing error: {0}")]
    LLMParsing(String),
    #[error("Formatting error: {0}")]
    Formatting(String),
    #[error("OpenAI error: {0}")]
    OpenAI(#[from] OpenAIError),
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Task join error: {0}")]
    Join(#[from] JoinError),
}

impl AppError {
    pub fn staging(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Staging {
            context: context.into(),
            source,
        }
    }

    pub fn comparison(context: impl Into<String>, source: AppError) -> Self {
        Self::Comparison {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// True for errors caused by caller input rather than by the system.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Encrypted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn staging_error_keeps_io_cause() {
        let err = AppError::staging(
            "An error occurred while deleting existing files",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );

        assert!(err.to_string().contains("deleting existing files"));
        let source = err.source().expect("io source");
        assert_eq!(source.to_string(), "denied");
    }

    #[test]
    fn comparison_error_wraps_inner_error() {
        let err = AppError::comparison(
            "Error while comparing documents",
            AppError::LLMParsing("bad json".into()),
        );

        assert!(matches!(
            &err,
            AppError::Comparison { source, .. } if matches!(**source, AppError::LLMParsing(_))
        ));
        assert!(err.to_string().contains("bad json"));
    }

    #[test]
    fn client_errors_are_validation_and_encryption() {
        assert!(AppError::Validation("x".into()).is_client_error());
        assert!(AppError::Encrypted("a.pdf".into()).is_client_error());
        assert!(!AppError::PdfRead("broken".into()).is_client_error());
        assert!(!AppError::Configuration("missing".into()).is_client_error());
    }
}
