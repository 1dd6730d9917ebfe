//! Настройка логирования: stdout + ежедневный файл logs/log_YYYY-MM-DD.log

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{PipelineError, Result};

pub fn log_file_path(log_dir: impl AsRef<Path>) -> PathBuf {
    let date = chrono::Local::now().format("%Y-%m-%d");
    log_dir.as_ref().join(format!("log_{}.log", date))
}

/// Устанавливает глобальный subscriber; уровень берётся из RUST_LOG (по умолчанию info)
pub fn init(log_dir: impl AsRef<Path>) -> Result<PathBuf> {
    std::fs::create_dir_all(log_dir.as_ref())?;
    let path = log_file_path(log_dir);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .map_err(|e| PipelineError::config_with("failed to install logger", e))?;

    Ok(path)
}
