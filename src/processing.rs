//! Этап предобработки: очистка, кодирование, асимметрия, балансировка, отбор признаков

use std::path::Path;

use tracing::{error, info};

use crate::config::{AppConfig, ProcessingConfig};
use crate::error::{PipelineError, Result};
use crate::paths::ArtifactPaths;
use crate::preprocessing::{
    align_columns, balance_classes, drop_id_and_duplicates, encode_columns, FeatureSelector,
    SkewCorrector, Smote,
};
use crate::types::Table;

/// Логирует ошибку шага и оборачивает её с контекстом
fn wrap(context: &'static str) -> impl FnOnce(PipelineError) -> PipelineError {
    move |e| {
        error!("{}: {}", context, e);
        PipelineError::preprocessing_with(context, e)
    }
}

pub fn load_data(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    info!("Loading data from {}", path.display());
    Table::read_csv(path).map_err(|e| {
        error!("Failed to load {}: {}", path.display(), e);
        PipelineError::preprocessing_with(format!("Failed to load {}", path.display()), e)
    })
}

pub struct DataPreprocessor {
    config: ProcessingConfig,
    paths: ArtifactPaths,
}

impl DataPreprocessor {
    pub fn new(config: &AppConfig, paths: ArtifactPaths) -> Result<Self> {
        std::fs::create_dir_all(&paths.processed_dir)?;
        Ok(Self {
            config: config.data_processing.clone(),
            paths,
        })
    }

    /// Удаление идентификатора и дубликатов, label encoding, коррекция асимметрии
    pub fn preprocess_data(&self, mut table: Table) -> Result<Table> {
        info!("Starting data preprocessing");
        self.try_preprocess(&mut table)
            .map_err(wrap("Error during data preprocessing"))?;
        Ok(table)
    }

    fn try_preprocess(&self, table: &mut Table) -> Result<()> {
        info!("Dropping columns");
        let removed = drop_id_and_duplicates(table, &self.config.id_column)?;
        info!("Removed {} duplicate rows", removed);

        info!("Applying label encoding");
        let mappings = encode_columns(table, &self.config.categorical_features)?;
        info!("Label mappings:");
        for (column, mapping) in &mappings {
            let pairs: Vec<String> = mapping
                .iter()
                .map(|(label, code)| format!("{}: {}", label, code))
                .collect();
            info!("{}: {{{}}}", column, pairs.join(", "));
        }

        info!("Skewness handling");
        let corrector = SkewCorrector::new(self.config.skewness_threshold);
        for (column, skew) in corrector.correct(table, &self.config.numerical_features)? {
            info!("Applied log1p to {} (skewness {:.3})", column, skew);
        }

        Ok(())
    }

    pub fn handle_imbalance(&self, table: &Table) -> Result<Table> {
        info!("Handling imbalanced data");
        let smote = Smote::new()
            .with_k_neighbors(self.config.smote_k_neighbors)
            .with_seed(self.config.random_state);

        let balanced = balance_classes(table, &self.config.target_column, &smote)
            .map_err(wrap("Error during imbalance handling"))?;

        info!(
            "Imbalance handling completed: {} -> {} rows",
            table.n_rows(),
            balanced.n_rows()
        );
        Ok(balanced)
    }

    pub fn feature_selection(&self, table: &Table) -> Result<Table> {
        info!("Starting feature selection");
        let selector = FeatureSelector::new(self.config.num_features_to_select)
            .with_n_estimators(self.config.n_estimators)
            .with_tree_limits(self.config.max_depth, self.config.min_weight_split)
            .with_seed(self.config.random_state);

        let (selected, ranking) = selector
            .select(table, &self.config.target_column)
            .map_err(wrap("Error during feature selection"))?;

        let names: Vec<&str> = ranking.iter().map(|(name, _)| name.as_str()).collect();
        info!("Top {} features selected: {:?}", ranking.len(), names);
        for (name, importance) in &ranking {
            tracing::debug!("{}: {:.4}", name, importance);
        }
        info!("Feature selection completed");
        Ok(selected)
    }

    pub fn save_data(&self, table: &Table, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        info!("Saving processed data");
        table.write_csv(path).map_err(wrap("Error saving data"))?;
        info!("Data saved to {}", path.display());
        Ok(())
    }

    pub fn process(&self) -> Result<()> {
        self.try_process().map_err(wrap("Error in data preprocessing"))
    }

    fn try_process(&self) -> Result<()> {
        info!("Loading data from raw directory");
        let train = load_data(&self.paths.train_file)?;
        let test = load_data(&self.paths.test_file)?;

        // Каждая таблица кодируется и балансируется независимо
        let train = self.preprocess_data(train)?;
        let test = self.preprocess_data(test)?;

        let train = self.handle_imbalance(&train)?;
        let test = self.handle_imbalance(&test)?;

        let train = self.feature_selection(&train)?;
        let test = align_columns(&test, &train)?;

        self.save_data(&train, &self.paths.processed_train_file)?;
        self.save_data(&test, &self.paths.processed_test_file)?;

        info!("Data preprocessing completed successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preprocessor(dir: &Path, yaml_extra: &str) -> DataPreprocessor {
        let yaml = format!(
            r#"
data_ingestion:
  bucket_name: "bookings"
  bucket_file_name: "raw.csv"
  train_ratio: 0.8
data_processing:
  categorical_features: [market_segment_type]
  numerical_features: [lead_time]
  skewness_threshold: 1.0
  num_features_to_select: 1
{}
"#,
            yaml_extra
        );
        let config = AppConfig::from_yaml_str(&yaml).unwrap();
        DataPreprocessor::new(&config, ArtifactPaths::new(dir)).unwrap()
    }

    const RAW: &str = "\
Booking_ID,market_segment_type,lead_time,booking_status
INN1,Online,0,Not_Canceled
INN2,Offline,1,Not_Canceled
INN3,Online,1,Canceled
INN4,Online,1,Canceled
INN5,Online,1,Canceled
";

    #[test]
    fn test_preprocess_drops_id_encodes_and_corrects() {
        let dir = tempfile::tempdir().unwrap();
        let table = Table::from_csv(RAW.as_bytes()).unwrap();

        let processed = preprocessor(dir.path(), "").preprocess_data(table).unwrap();

        assert!(!processed.has_column("Booking_ID"));
        // INN4 и INN5 совпадают с INN3 после удаления идентификатора
        assert_eq!(processed.n_rows(), 3);
        assert_eq!(
            processed.column("market_segment_type").unwrap().as_numeric().unwrap(),
            &[1.0, 0.0, 1.0]
        );
    }

    #[test]
    fn test_preprocess_error_is_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let table = Table::from_csv(RAW.as_bytes()).unwrap();

        let err = preprocessor(dir.path(), "  id_column: Reservation_ID")
            .preprocess_data(table)
            .unwrap_err();

        assert_eq!(err.to_string(), "Preprocessing error: Error during data preprocessing");
        let cause = std::error::Error::source(&err).unwrap().to_string();
        assert!(cause.contains("Reservation_ID"), "cause = {}", cause);
    }

    #[test]
    fn test_imbalance_with_tiny_class_fails() {
        let dir = tempfile::tempdir().unwrap();
        let table = Table::from_csv(RAW.as_bytes()).unwrap();
        let pre = preprocessor(dir.path(), "");
        let processed = pre.preprocess_data(table).unwrap();

        let err = pre.handle_imbalance(&processed).unwrap_err();
        assert!(err.to_string().contains("imbalance handling"));
    }

    #[test]
    fn test_process_fails_without_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let err = preprocessor(dir.path(), "").process().unwrap_err();
        assert!(matches!(err, PipelineError::Preprocessing { .. }));
    }
}
