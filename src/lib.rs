//! Booking Prep - подготовка данных для предсказания отмены бронирований

pub mod config;
pub mod error;
pub mod ingestion;
pub mod logging;
pub mod models;
pub mod paths;
pub mod preprocessing;
pub mod processing;
pub mod storage;
pub mod types;

pub use config::{read_yaml, AppConfig};
pub use error::{PipelineError, Result};
pub use ingestion::DataIngestion;
pub use paths::ArtifactPaths;
pub use processing::DataPreprocessor;
pub use types::{Column, Table};
