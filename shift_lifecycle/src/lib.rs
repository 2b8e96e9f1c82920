pub mod error;
pub mod lifecycle;
pub mod model;
pub mod ordering;

pub use error::LifecycleError;
pub use lifecycle::{
    apply_edit, change_status, recalculate_chain, reorder, sweep, ReorderTarget, SweepPlan,
};
pub use model::{
    duration_between, end_after, ensure_supported, Hours, NewShift, Shift, ShiftId, ShiftStatus,
    Timestamp,
};
pub use ordering::{display_order, display_rank, sort_sequence};
