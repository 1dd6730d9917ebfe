//! Загрузка сырых данных из объектного хранилища и разбиение на train/test

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{error, info};

use crate::config::{AppConfig, IngestionConfig};
use crate::error::{PipelineError, Result};
use crate::paths::ArtifactPaths;
use crate::storage::ObjectStore;
use crate::types::Table;

/// Перемешивает строки с фиксированным seed: первые ceil(test_fraction * n) уходят в test
pub fn train_test_split(table: &Table, test_fraction: f64, seed: u64) -> Result<(Table, Table)> {
    let n_samples = table.n_rows();
    let n_test = (test_fraction * n_samples as f64).ceil() as usize;
    let n_train = n_samples.saturating_sub(n_test);

    if n_test == 0 || n_train == 0 {
        return Err(PipelineError::ingestion(format!(
            "with {} samples and test fraction {} one of the partitions would be empty",
            n_samples, test_fraction
        )));
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let (test_idx, train_idx) = indices.split_at(n_test);
    Ok((table.select_rows(train_idx), table.select_rows(test_idx)))
}

pub struct DataIngestion<S: ObjectStore> {
    config: IngestionConfig,
    paths: ArtifactPaths,
    store: S,
}

impl<S: ObjectStore> DataIngestion<S> {
    pub fn new(config: &AppConfig, paths: ArtifactPaths, store: S) -> Result<Self> {
        std::fs::create_dir_all(&paths.raw_dir)?;

        let config = config.data_ingestion.clone();
        info!(
            "Data Ingestion initialized with bucket: {}, file: {}",
            config.bucket_name, config.bucket_file_name
        );

        Ok(Self { config, paths, store })
    }

    pub async fn download_csv(&self) -> Result<()> {
        let bytes = self
            .store
            .download(
                &self.config.bucket_name,
                &self.config.bucket_file_name,
                &self.paths.raw_file,
            )
            .await
            .map_err(|e| {
                error!("Error downloading file from storage: {}", e);
                PipelineError::ingestion_with("Error downloading file from storage", e)
            })?;

        info!(
            "File {} downloaded from bucket {} to {} ({} bytes)",
            self.config.bucket_file_name,
            self.config.bucket_name,
            self.paths.raw_file.display(),
            bytes
        );
        Ok(())
    }

    pub fn split_data(&self) -> Result<()> {
        info!("Starting data split process");
        self.try_split().map_err(|e| {
            error!("Error during data split: {}", e);
            PipelineError::ingestion_with("Error during data split", e)
        })
    }

    fn try_split(&self) -> Result<()> {
        let data = Table::read_csv(&self.paths.raw_file)?;
        let (train, test) = train_test_split(
            &data,
            1.0 - self.config.train_ratio,
            self.config.random_state,
        )?;

        train.write_csv(&self.paths.train_file)?;
        test.write_csv(&self.paths.test_file)?;

        info!(
            "Data split completed. Train data ({} rows) saved to {}, Test data ({} rows) saved to {}",
            train.n_rows(),
            self.paths.train_file.display(),
            test.n_rows(),
            self.paths.test_file.display()
        );
        Ok(())
    }

    /// Ошибка логируется и возвращается вызывающему
    pub async fn run(&self) -> Result<()> {
        info!("Starting data ingestion process");

        let result: Result<()> = async {
            self.download_csv().await?;
            self.split_data()
        }
        .await;

        match &result {
            Ok(()) => info!("Data ingestion process completed successfully"),
            Err(e) => error!("Error in data ingestion process: {}", e),
        }
        info!("Data ingestion process finished");

        result
    }
}
