use std::cmp::Ordering;

use crate::model::{Shift, ShiftStatus};

/// コレクション順。ストアの getAll と同じく start_time、同時刻は id で決める
fn sequence_cmp(a: &Shift, b: &Shift) -> Ordering {
    a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id))
}

pub fn sort_sequence(shifts: &mut [Shift]) {
    shifts.sort_by(sequence_cmp);
}


/// 表示上の優先度。同順位はコレクション上の順序を保つ
pub fn display_rank(status: ShiftStatus) -> u8 {
    match status {
        ShiftStatus::Active => 0,
        ShiftStatus::Scheduled => 1,
        ShiftStatus::Completed => 2,
        ShiftStatus::OnHold => 3,
        ShiftStatus::Terminated => 4,
    }
}

/// 表示用の並び（永続化はしない）
pub fn display_order(shifts: &[Shift]) -> Vec<&Shift> {
    let mut ordered: Vec<&Shift> = shifts.iter().collect();
    // sort_by_key は安定ソート
    ordered.sort_by_key(|s| display_rank(s.status));
    ordered
}
