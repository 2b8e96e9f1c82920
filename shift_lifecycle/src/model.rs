// =====================
// ドメインモデル定義
// =====================

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LifecycleError;

pub type Timestamp = DateTime<Utc>;

/// 時間単位のシフト長
pub type Hours = f64;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;
const NANOS_PER_HOUR: f64 = 3_600_000_000_000.0;

/// 扱える年の範囲。RFC 3339 表記が4桁の年で固定幅になる範囲に限る
pub const EARLIEST_YEAR: i32 = 0;
pub const LATEST_YEAR: i32 = 9999;

/// シフトの識別子（作成後は変更しない）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShiftId(String);

impl ShiftId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ShiftId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ShiftId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ShiftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShiftStatus {
    Scheduled,
    Active,
    OnHold,
    Terminated,
    Completed,
}

impl ShiftStatus {
    pub const ALL: [ShiftStatus; 5] = [
        ShiftStatus::Scheduled,
        ShiftStatus::Active,
        ShiftStatus::OnHold,
        ShiftStatus::Terminated,
        ShiftStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftStatus::Scheduled => "scheduled",
            ShiftStatus::Active => "active",
            ShiftStatus::OnHold => "onHold",
            ShiftStatus::Terminated => "terminated",
            ShiftStatus::Completed => "completed",
        }
    }

    /// completed / terminated からはどこへも遷移しない
    pub fn is_terminal(&self) -> bool {
        matches!(self, ShiftStatus::Completed | ShiftStatus::Terminated)
    }

    /// 手動操作で許可される遷移
    ///
    /// ```text
    /// scheduled -> active -> onHold -> active
    ///     |          |         |
    ///     +----------+---------+--> terminated
    /// ```
    /// active -> completed は時間経過 (sweep) のみ
    pub fn can_transition_to(&self, to: ShiftStatus) -> bool {
        use ShiftStatus::*;
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, to),
            (Scheduled, Active)
                | (Active, OnHold)
                | (OnHold, Active)
                | (Scheduled, Terminated)
                | (Active, Terminated)
                | (OnHold, Terminated)
        )
    }
}

impl fmt::Display for ShiftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShiftStatus {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShiftStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| LifecycleError::UnknownStatus(s.to_string()))
    }
}

/// 作成リクエスト（id と status はシステム側で決める）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewShift {
    pub particulars: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: ShiftId,
    pub particulars: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    /// start_time / end_time から導出した値を非正規化して保持する
    pub duration: Hours,
    pub status: ShiftStatus,
    #[serde(default)]
    pub notes: String,
}

impl Shift {
    /// 新規シフトは必ず scheduled で作られる
    pub fn create(new_shift: NewShift) -> Result<Self, LifecycleError> {
        Self::create_with_id(ShiftId::generate(), new_shift)
    }

    pub fn create_with_id(id: ShiftId, new_shift: NewShift) -> Result<Self, LifecycleError> {
        let duration = duration_between(new_shift.start_time, new_shift.end_time)?;
        Ok(Self {
            id,
            particulars: new_shift.particulars,
            start_time: new_shift.start_time,
            end_time: new_shift.end_time,
            duration,
            status: ShiftStatus::Scheduled,
            notes: new_shift.notes,
        })
    }

    /// 長さを保ったまま start を動かす。失敗したときは元のまま
    pub fn reschedule_from(&mut self, start: Timestamp) -> Result<(), LifecycleError> {
        let end = end_after(start, self.duration)?;
        self.start_time = start;
        self.end_time = end;
        Ok(())
    }

    pub fn has_valid_range(&self) -> bool {
        self.end_time > self.start_time
    }
}

pub fn ensure_supported(time: Timestamp) -> Result<Timestamp, LifecycleError> {
    if (EARLIEST_YEAR..=LATEST_YEAR).contains(&time.year()) {
        Ok(time)
    } else {
        Err(LifecycleError::UnsupportedTimestamp(time))
    }
}

/// end > start を検証して時間数を返す
pub fn duration_between(start: Timestamp, end: Timestamp) -> Result<Hours, LifecycleError> {
    ensure_supported(start)?;
    ensure_supported(end)?;
    if end <= start {
        return Err(LifecycleError::InvalidTimeRange { start, end });
    }
    let span = end - start;
    // i64 のナノ秒に収まらない (約292年超) 場合はミリ秒精度
    Ok(match span.num_nanoseconds() {
        Some(nanos) => nanos as f64 / NANOS_PER_HOUR,
        None => span.num_milliseconds() as f64 / MILLIS_PER_HOUR,
    })
}

/// start から duration 時間後。結果は必ず start より後で、扱える範囲に収まる
pub fn end_after(start: Timestamp, duration: Hours) -> Result<Timestamp, LifecycleError> {
    if !duration.is_finite() || duration <= 0.0 {
        return Err(LifecycleError::InvalidDuration(duration));
    }
    let nanos = (duration * NANOS_PER_HOUR).round();
    let span = if nanos < i64::MAX as f64 {
        Duration::nanoseconds(nanos as i64)
    } else {
        Duration::milliseconds((duration * MILLIS_PER_HOUR).round() as i64)
    };
    let end = start
        .checked_add_signed(span)
        .ok_or(LifecycleError::ScheduleOverflow { start, duration })?;
    if end <= start {
        return Err(LifecycleError::InvalidDuration(duration));
    }
    ensure_supported(end).map_err(|_| LifecycleError::ScheduleOverflow { start, duration })
}
