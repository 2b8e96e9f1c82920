use thiserror::Error;

use shift_lifecycle::{LifecycleError, ShiftId};

use crate::infrastructure::StoreError;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("shift not found: {0}")]
    ShiftNotFound(ShiftId),

    /// 読み込み前 / 読み込み失敗中の操作
    #[error("shifts are not loaded")]
    NotLoaded,

    #[error("snapshot contains shift {0} more than once")]
    DuplicateSnapshotId(ShiftId),

    #[error("invalid snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

pub type BoardResult<T> = Result<T, BoardError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
