/// Загрузка сырого CSV из Google Cloud Storage и разбиение на train/test

use booking_prep::paths::{CONFIG_PATH, LOG_DIR};
use booking_prep::storage::GcsStore;
use booking_prep::{logging, read_yaml, ArtifactPaths, DataIngestion};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init(LOG_DIR)?;

    let config = read_yaml(CONFIG_PATH)?;
    let ingestion = DataIngestion::new(&config, ArtifactPaths::default(), GcsStore::from_env())?;
    ingestion.run().await?;

    Ok(())
}
