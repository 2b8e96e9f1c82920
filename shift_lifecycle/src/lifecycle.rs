// --- シフトのライフサイクル計算 ---
//
// 入力 (シフト列 + 現在時刻) から変更後のレコードを計算するだけで、
// 永続化やメモリ上の状態更新は呼び出し側が行う

use serde::{Deserialize, Serialize};

use crate::error::LifecycleError;
use crate::model::{duration_between, Shift, ShiftId, ShiftStatus, Timestamp};

/// 1回の sweep で発生した変更
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepPlan {
    pub completed: Vec<ShiftId>,
    pub activated: Option<ShiftId>,
    /// 永続化すべき変更後のレコード
    pub changes: Vec<Shift>,
}

impl SweepPlan {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// 並び替えの移動先
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReorderTarget {
    First,
    /// 指定したシフトの直後
    After(ShiftId),
    /// 移動後のシーケンス上の位置（末尾を超える値は末尾に丸める）
    Position(usize),
}

/// 終了時刻を過ぎた active を completed にし、
/// 何か完了した場合に限り先頭の scheduled を1件だけ active にする
pub fn sweep(shifts: &[Shift], now: Timestamp) -> Result<SweepPlan, LifecycleError> {
    let mut plan = SweepPlan::default();

    for shift in shifts {
        if shift.status == ShiftStatus::Active && shift.end_time <= now {
            let mut done = shift.clone();
            done.status = ShiftStatus::Completed;
            plan.completed.push(done.id.clone());
            plan.changes.push(done);
        }
    }

    if plan.completed.is_empty() {
        return Ok(plan);
    }

    // 複数完了しても起動するのは1件だけ（次の tick でまた先頭を探す）
    if let Some(next) = shifts.iter().find(|s| s.status == ShiftStatus::Scheduled) {
        let mut started = next.clone();
        started.status = ShiftStatus::Active;
        started.reschedule_from(now)?;
        plan.activated = Some(started.id.clone());
        plan.changes.push(started);
    }

    Ok(plan)
}

/// 手動のステータス変更
///
/// 戻り値は変更されたレコード。先頭が対象シフトで、
/// 有効化によって onHold に回された他の active が後に続く。
/// 同じステータスへの変更は空を返す。
pub fn change_status(
    shifts: &[Shift],
    id: &ShiftId,
    to: ShiftStatus,
    now: Timestamp,
) -> Result<Vec<Shift>, LifecycleError> {
    let target = shifts
        .iter()
        .find(|s| &s.id == id)
        .ok_or_else(|| LifecycleError::ShiftNotFound(id.clone()))?;

    let from = target.status;
    if from == to {
        return Ok(Vec::new());
    }
    if !from.can_transition_to(to) {
        return Err(LifecycleError::InvalidTransition {
            id: id.clone(),
            from,
            to,
        });
    }

    let mut updated = target.clone();
    updated.status = to;
    // onHold からの再開では時刻を動かさない
    if from == ShiftStatus::Scheduled && to == ShiftStatus::Active {
        updated.reschedule_from(now)?;
    }

    let mut changes = vec![updated];
    if to == ShiftStatus::Active {
        changes.extend(
            shifts
                .iter()
                .filter(|s| &s.id != id && s.status == ShiftStatus::Active)
                .map(|s| {
                    let mut paused = s.clone();
                    paused.status = ShiftStatus::OnHold;
                    paused
                }),
        );
    }
    Ok(changes)
}

/// id を target へ移動し、時刻を連鎖的に再計算した新しいシーケンスを返す
pub fn reorder(
    shifts: &[Shift],
    id: &ShiftId,
    target: &ReorderTarget,
) -> Result<Vec<Shift>, LifecycleError> {
    let from = shifts
        .iter()
        .position(|s| &s.id == id)
        .ok_or_else(|| LifecycleError::ShiftNotFound(id.clone()))?;

    let mut sequence = shifts.to_vec();
    let moving = sequence.remove(from);

    let to = match target {
        ReorderTarget::First => 0,
        ReorderTarget::After(preceding) => {
            if preceding == id {
                return Err(LifecycleError::InvalidReorderTarget(id.clone()));
            }
            let index = sequence
                .iter()
                .position(|s| &s.id == preceding)
                .ok_or_else(|| LifecycleError::ShiftNotFound(preceding.clone()))?;
            index + 1
        }
        ReorderTarget::Position(index) => (*index).min(sequence.len()),
    };

    sequence.insert(to, moving);
    recalculate_chain(&mut sequence)?;
    Ok(sequence)
}

/// 先頭はそのまま、2件目以降は直前の end_time から duration 分を割り当てる
///
/// ```text
/// [B 11-13] [A 10-11] [C 13-14]
///     |  end=13 -> A 13-14
///               end=14 -> C 14-15
/// ```
pub fn recalculate_chain(sequence: &mut [Shift]) -> Result<(), LifecycleError> {
    for index in 1..sequence.len() {
        let previous_end = sequence[index - 1].end_time;
        sequence[index].reschedule_from(previous_end)?;
    }
    Ok(())
}

/// 編集内容を適用する。ステータスは既存レコードのものを維持する
pub fn apply_edit(existing: &Shift, edited: Shift) -> Result<Shift, LifecycleError> {
    if existing.id != edited.id {
        return Err(LifecycleError::IdMismatch {
            existing: existing.id.clone(),
            edited: edited.id,
        });
    }

    let unchanged =
        edited.start_time == existing.start_time && edited.end_time == existing.end_time;
    let duration = if unchanged {
        existing.duration
    } else {
        duration_between(edited.start_time, edited.end_time)?
    };

    Ok(Shift {
        duration,
        status: existing.status,
        ..edited
    })
}
