//! Ошибки пайплайна подготовки данных

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Конфигурация не прочитана или не прошла проверку
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Загрузка из хранилища или разбиение на train/test
    #[error("Ingestion error: {message}")]
    Ingestion {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Любой шаг предобработки
    #[error("Preprocessing error: {message}")]
    Preprocessing {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl PipelineError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_with(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn ingestion(message: impl Into<String>) -> Self {
        Self::Ingestion {
            message: message.into(),
            source: None,
        }
    }

    pub fn ingestion_with(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Ingestion {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn preprocessing(message: impl Into<String>) -> Self {
        Self::Preprocessing {
            message: message.into(),
            source: None,
        }
    }

    pub fn preprocessing_with(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Preprocessing {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}
