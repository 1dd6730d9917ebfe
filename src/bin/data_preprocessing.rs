/// Предобработка train/test и сохранение результатов в artifacts/processed

use booking_prep::paths::{CONFIG_PATH, LOG_DIR};
use booking_prep::{logging, read_yaml, ArtifactPaths, DataPreprocessor};

fn main() -> anyhow::Result<()> {
    logging::init(LOG_DIR)?;

    let config = read_yaml(CONFIG_PATH)?;
    let preprocessor = DataPreprocessor::new(&config, ArtifactPaths::default())?;
    preprocessor.process()?;

    Ok(())
}
