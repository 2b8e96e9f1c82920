use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use shift_board::application::controller::ShiftBoard;
use shift_board::domain::clock::ManualClock;
use shift_board::domain::NewShift;
use shift_board::infrastructure::{ShiftStore, SqliteShiftStore};

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 14, hour, minute, 0).unwrap()
}

pub fn new_shift(particulars: &str, start: u32, end: u32) -> NewShift {
    NewShift {
        particulars: particulars.to_string(),
        start_time: at(start, 0),
        end_time: at(end, 0),
        notes: String::new(),
    }
}

/// メモリ上 SQLite + 手動時計で読み込み済みのボードを作る
pub async fn loaded_board(
    now: DateTime<Utc>,
) -> (ShiftBoard, Arc<SqliteShiftStore>, Arc<ManualClock>) {
    let store = Arc::new(SqliteShiftStore::in_memory().await.expect("Failed to open store"));
    let clock = Arc::new(ManualClock::new(now));
    let mut board = ShiftBoard::new(store.clone() as Arc<dyn ShiftStore>, clock.clone());
    board.load().await.expect("Failed to load");
    (board, store, clock)
}
