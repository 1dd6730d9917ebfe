/// Расположение артефактов пайплайна на диске

use std::path::{Path, PathBuf};

pub const CONFIG_PATH: &str = "config/config.yaml";
pub const ARTIFACTS_DIR: &str = "artifacts";
pub const LOG_DIR: &str = "logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub raw_dir: PathBuf,
    pub raw_file: PathBuf,
    pub train_file: PathBuf,
    pub test_file: PathBuf,
    pub processed_dir: PathBuf,
    pub processed_train_file: PathBuf,
    pub processed_test_file: PathBuf,
}

impl ArtifactPaths {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let raw_dir = root.join("raw");
        let processed_dir = root.join("processed");

        Self {
            raw_file: raw_dir.join("raw.csv"),
            train_file: raw_dir.join("train.csv"),
            test_file: raw_dir.join("test.csv"),
            processed_train_file: processed_dir.join("processed_train.csv"),
            processed_test_file: processed_dir.join("processed_test.csv"),
            raw_dir,
            processed_dir,
        }
    }
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self::new(ARTIFACTS_DIR)
    }
}
