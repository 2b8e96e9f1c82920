use shift_lifecycle::ShiftId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("shift already exists: {0}")]
    DuplicateId(ShiftId),

    /// ストアの制約 (end_time > start_time) を満たさないレコード
    #[error("shift {0} violates the store constraints")]
    ConstraintViolation(ShiftId),

    #[error("corrupt shift record {id}: {reason}")]
    CorruptRecord { id: String, reason: String },
}

impl StoreError {
    /// ストアそのものが使えないことを示すエラーか
    ///
    /// DuplicateId や制約違反 (CHECK / NOT NULL など) はレコード側の問題なので
    /// フォールバックせず呼び出し元へ返す
    pub fn triggers_fallback(&self) -> bool {
        match self {
            StoreError::DuplicateId(_) | StoreError::ConstraintViolation(_) => false,
            StoreError::Database(sqlx::Error::Database(db)) => {
                matches!(db.kind(), sqlx::error::ErrorKind::Other)
            }
            _ => true,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
