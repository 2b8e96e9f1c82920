// =====================
// ドメインモデル
// =====================
// シフトのモデルと遷移計算は shift_lifecycle クレートにある

pub mod clock;

pub use shift_lifecycle::{
    LifecycleError, NewShift, ReorderTarget, Shift, ShiftId, ShiftStatus, SweepPlan, Timestamp,
};
