use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::application::error::ConfigError;

pub const CONFIG_ENV: &str = "SHIFT_BOARD_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "shift-board.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub storage: StorageConfig,
    pub sweep: SweepConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// 主ストア (SQLite)
    pub database_url: String,
    /// 副ストア (JSON ファイル)
    pub fallback_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://shift-board.db".to_string(),
            fallback_path: PathBuf::from("shift-board.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub interval_ms: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self { interval_ms: 1000 }
    }
}

impl SweepConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "shift_board=info,shift_lifecycle=info".to_string(),
        }
    }
}

impl BoardConfig {
    /// ファイルがなければデフォルト値
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = if fs::try_exists(path).await.unwrap_or(false) {
            let content = fs::read_to_string(path).await.map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// SHIFT_BOARD_CONFIG またはカレントディレクトリの shift-board.toml
    pub async fn load_default() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(Path::new(&path)).await
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.storage.database_url.trim().is_empty() {
            errors.push("storage.database_url must not be empty");
        }
        if self.storage.fallback_path.as_os_str().is_empty() {
            errors.push("storage.fallback_path must not be empty");
        }
        if self.sweep.interval_ms == 0 {
            errors.push("sweep.interval_ms must be greater than 0");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors.join("; ")))
        }
    }
}
