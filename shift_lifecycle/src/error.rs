use thiserror::Error;

use crate::model::{Hours, ShiftId, ShiftStatus, Timestamp};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LifecycleError {
    /// end <= start
    #[error("invalid time range: end {end} is not after start {start}")]
    InvalidTimeRange { start: Timestamp, end: Timestamp },

    /// 年が 0000-9999 の外
    #[error("unsupported timestamp: {0}")]
    UnsupportedTimestamp(Timestamp),

    #[error("cannot schedule {duration} hours from {start}")]
    ScheduleOverflow { start: Timestamp, duration: Hours },

    #[error("invalid shift duration: {0}")]
    InvalidDuration(Hours),

    #[error("cannot transition shift {id} from {from} to {to}")]
    InvalidTransition {
        id: ShiftId,
        from: ShiftStatus,
        to: ShiftStatus,
    },

    #[error("shift not found: {0}")]
    ShiftNotFound(ShiftId),

    #[error("edited shift id {edited} does not match {existing}")]
    IdMismatch { existing: ShiftId, edited: ShiftId },

    #[error("invalid reorder target for shift {0}")]
    InvalidReorderTarget(ShiftId),

    #[error("unknown shift status: {0}")]
    UnknownStatus(String),
}
