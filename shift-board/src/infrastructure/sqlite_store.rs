use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    FromRow, SqlitePool,
};
use tracing::info;

use shift_lifecycle::model::{EARLIEST_YEAR, LATEST_YEAR};
use shift_lifecycle::{Shift, ShiftId, ShiftStatus, Timestamp};

use crate::infrastructure::error::{StoreError, StoreResult};
use crate::infrastructure::store::ShiftStore;

/// 主ストア: SQLite + status / start_time インデックス
pub struct SqliteShiftStore {
    pool: SqlitePool,
}

// =====================
// DB読み込み用ヘルパー構造体
// =====================

#[derive(FromRow)]
struct ShiftRow {
    id: String,
    particulars: String,
    start_time: String,
    end_time: String,
    duration: f64,
    status: String,
    notes: String,
}

impl TryFrom<ShiftRow> for Shift {
    type Error = StoreError;

    fn try_from(row: ShiftRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| StoreError::CorruptRecord {
            id: row.id.clone(),
            reason,
        };
        let start_time = decode_time(&row.start_time).map_err(|e| corrupt(e.to_string()))?;
        let end_time = decode_time(&row.end_time).map_err(|e| corrupt(e.to_string()))?;
        let status = ShiftStatus::from_str(&row.status).map_err(|e| corrupt(e.to_string()))?;

        Ok(Shift {
            id: ShiftId::from(row.id),
            particulars: row.particulars,
            start_time,
            end_time,
            duration: row.duration,
            status,
            notes: row.notes,
        })
    }
}

/// 固定幅の RFC3339 (ナノ秒, Z) で保存するので文字列比較 = 時刻比較になる
/// (ドメイン側で年を 0000-9999 に制限している)
fn encode_time(t: Timestamp) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

const EARLIEST_TEXT: &str = "0000-01-01T00:00:00.000000000Z";
const LATEST_TEXT: &str = "9999-12-31T23:59:59.999999999Z";

/// 検索範囲の端。保存できる範囲の外は端に丸め、範囲と重ならなければ None
fn encode_bounds(start: Timestamp, end: Timestamp) -> Option<(String, String)> {
    if start.year() > LATEST_YEAR || end.year() < EARLIEST_YEAR {
        return None;
    }
    let lower = if start.year() < EARLIEST_YEAR {
        EARLIEST_TEXT.to_string()
    } else {
        encode_time(start)
    };
    let upper = if end.year() > LATEST_YEAR {
        LATEST_TEXT.to_string()
    } else {
        encode_time(end)
    };
    Some((lower, upper))
}

fn decode_time(s: &str) -> Result<Timestamp, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|t| t.with_timezone(&Utc))
}

fn into_shifts(rows: Vec<ShiftRow>) -> StoreResult<Vec<Shift>> {
    rows.into_iter().map(Shift::try_from).collect()
}

const SELECT_COLUMNS: &str =
    "SELECT id, particulars, start_time, end_time, duration, status, notes FROM shifts";

impl SqliteShiftStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 接続してマイグレーションまで済ませる
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!(database_url, "sqlite shift store ready");

        Ok(Self::new(pool))
    }

    /// テスト用: メモリ上のDB（接続が切れると消えるので1本に固定する）
    pub async fn in_memory() -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self::new(pool))
    }

    /// プールを閉じる。以降の操作はすべてエラーになる
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ShiftStore for SqliteShiftStore {
    async fn get_all(&self) -> StoreResult<Vec<Shift>> {
        let rows = sqlx::query_as::<_, ShiftRow>(&format!(
            "{SELECT_COLUMNS} ORDER BY start_time ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        into_shifts(rows)
    }

    async fn create(&self, shift: &Shift) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO shifts (
                id,
                particulars,
                start_time,
                end_time,
                duration,
                status,
                notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(shift.id.as_str())
        .bind(&shift.particulars)
        .bind(encode_time(shift.start_time))
        .bind(encode_time(shift.end_time))
        .bind(shift.duration)
        .bind(shift.status.as_str())
        .bind(&shift.notes)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::DuplicateId(shift.id.clone())
            }
            _ => StoreError::from(e),
        })?;
        Ok(())
    }

    async fn update(&self, shift: &Shift) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO shifts (
                id,
                particulars,
                start_time,
                end_time,
                duration,
                status,
                notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                particulars = excluded.particulars,
                start_time = excluded.start_time,
                end_time = excluded.end_time,
                duration = excluded.duration,
                status = excluded.status,
                notes = excluded.notes",
        )
        .bind(shift.id.as_str())
        .bind(&shift.particulars)
        .bind(encode_time(shift.start_time))
        .bind(encode_time(shift.end_time))
        .bind(shift.duration)
        .bind(shift.status.as_str())
        .bind(&shift.notes)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: &ShiftId) -> StoreResult<()> {
        sqlx::query("DELETE FROM shifts WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_by_id(&self, id: &ShiftId) -> StoreResult<Option<Shift>> {
        let row = sqlx::query_as::<_, ShiftRow>(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Shift::try_from).transpose()
    }

    async fn get_by_status(&self, status: ShiftStatus) -> StoreResult<Vec<Shift>> {
        let rows = sqlx::query_as::<_, ShiftRow>(&format!(
            "{SELECT_COLUMNS} WHERE status = ?1 ORDER BY start_time ASC, id ASC"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;
        into_shifts(rows)
    }

    async fn get_by_date_range(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> StoreResult<Vec<Shift>> {
        let Some((lower, upper)) = encode_bounds(start, end) else {
            return Ok(Vec::new());
        };
        let rows = sqlx::query_as::<_, ShiftRow>(&format!(
            "{SELECT_COLUMNS} WHERE start_time >= ?1 AND start_time <= ?2 \
             ORDER BY start_time ASC, id ASC"
        ))
        .bind(lower)
        .bind(upper)
        .fetch_all(&self.pool)
        .await?;
        into_shifts(rows)
    }
}
