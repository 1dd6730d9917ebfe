//! Конфигурация пайплайна (config/config.yaml)

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub data_ingestion: IngestionConfig,
    pub data_processing: ProcessingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    pub bucket_name: String,
    pub bucket_file_name: String,
    pub train_ratio: f64,
    #[serde(default = "default_random_state")]
    pub random_state: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub categorical_features: Vec<String>,
    pub numerical_features: Vec<String>,
    pub skewness_threshold: f64,
    pub num_features_to_select: usize,
    #[serde(default = "default_id_column")]
    pub id_column: String,
    #[serde(default = "default_target_column")]
    pub target_column: String,
    #[serde(default = "default_random_state")]
    pub random_state: u64,
    #[serde(default = "default_smote_k_neighbors")]
    pub smote_k_neighbors: usize,
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    /// Глубина деревьев леса; без ограничения деревья растут до чистых листьев
    #[serde(default)]
    pub max_depth: Option<usize>,
    #[serde(default = "default_min_weight_split")]
    pub min_weight_split: f32,
}

fn default_random_state() -> u64 { 42 }
fn default_id_column() -> String { "Booking_ID".to_string() }
fn default_target_column() -> String { "booking_status".to_string() }
fn default_smote_k_neighbors() -> usize { 5 }
fn default_n_estimators() -> usize { 100 }
fn default_min_weight_split() -> f32 { 2.0 }

impl AppConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: AppConfig = serde_yaml::from_str(content)
            .map_err(|e| PipelineError::config_with("invalid YAML configuration", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let ratio = self.data_ingestion.train_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(PipelineError::config(format!(
                "data_ingestion.train_ratio must be in (0, 1), got {}",
                ratio
            )));
        }

        let processing = &self.data_processing;
        if processing.num_features_to_select == 0 {
            return Err(PipelineError::config(
                "data_processing.num_features_to_select must be at least 1",
            ));
        }
        if processing.smote_k_neighbors == 0 {
            return Err(PipelineError::config(
                "data_processing.smote_k_neighbors must be at least 1",
            ));
        }
        if processing.n_estimators == 0 {
            return Err(PipelineError::config(
                "data_processing.n_estimators must be at least 1",
            ));
        }
        if processing.max_depth == Some(0) {
            return Err(PipelineError::config(
                "data_processing.max_depth must be at least 1",
            ));
        }
        if processing.min_weight_split.is_nan() || processing.min_weight_split < 1.0 {
            return Err(PipelineError::config(format!(
                "data_processing.min_weight_split must be at least 1, got {}",
                processing.min_weight_split
            )));
        }
        if processing.skewness_threshold.is_nan() {
            return Err(PipelineError::config(
                "data_processing.skewness_threshold must be a number",
            ));
        }

        Ok(())
    }
}

/// Чтение YAML-конфигурации с диска
pub fn read_yaml(path: impl AsRef<Path>) -> Result<AppConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::error!("YAML file not found at {}", path.display());
        return Err(PipelineError::config(format!(
            "YAML file not found at {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        tracing::error!("Error reading YAML file at {}: {}", path.display(), e);
        PipelineError::config_with(format!("Error reading YAML file {}", path.display()), e)
    })?;

    let config = AppConfig::from_yaml_str(&content).map_err(|e| {
        tracing::error!("Error reading YAML file at {}: {}", path.display(), e);
        e
    })?;

    tracing::info!("YAML file read successfully from {}", path.display());
    Ok(config)
}
