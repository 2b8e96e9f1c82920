use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use shift_lifecycle::{
    apply_edit, change_status, display_order, duration_between, reorder, sort_sequence, sweep,
    NewShift, ReorderTarget, Shift, ShiftId, ShiftStatus, SweepPlan, Timestamp,
};

use crate::application::error::{BoardError, BoardResult};
use crate::domain::clock::Clock;
use crate::infrastructure::ShiftStore;

/// 読み込み状態。Failed のときは一覧を出さずにエラー画面を出す
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    Failed(String),
}

/// エクスポート / インポート用の形式
#[derive(Debug, Serialize, Deserialize)]
pub struct ShiftSnapshot {
    #[serde(default)]
    pub shifts: Vec<Shift>,
}

pub type SharedBoard = Arc<Mutex<ShiftBoard>>;

/// UI からの操作を受け取り、ライフサイクル計算 -> 永続化 -> メモリ更新 の順で処理する
///
/// 永続化が1件でも失敗した場合はメモリ上のシフト列を更新しない。
/// シフト列は常にストアの getAll と同じ順 (start_time, id) に保つ。
pub struct ShiftBoard {
    store: Arc<dyn ShiftStore>,
    clock: Arc<dyn Clock>,
    shifts: Vec<Shift>,
    state: LoadState,
    error_banner: Option<String>,
}

impl ShiftBoard {
    pub fn new(store: Arc<dyn ShiftStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            shifts: Vec::new(),
            state: LoadState::Loading,
            error_banner: None,
        }
    }

    pub fn into_shared(self) -> SharedBoard {
        Arc::new(Mutex::new(self))
    }

    // =====================
    // 読み込み
    // =====================

    pub async fn load(&mut self) -> BoardResult<()> {
        self.state = LoadState::Loading;
        match self.store.get_all().await {
            Ok(shifts) => {
                info!(count = shifts.len(), "shifts loaded");
                self.shifts = shifts;
                sort_sequence(&mut self.shifts);
                self.state = LoadState::Ready;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "failed to load shifts");
                // 途中までの一覧は見せない
                self.shifts.clear();
                self.state = LoadState::Failed(e.to_string());
                Err(e.into())
            }
        }
    }

    /// エラー画面からの再試行
    pub async fn reload(&mut self) -> BoardResult<()> {
        self.error_banner = None;
        self.load().await
    }

    // =====================
    // UI 操作
    // =====================

    pub async fn create_shift(&mut self, new_shift: NewShift) -> BoardResult<Shift> {
        let result = self.try_create_shift(new_shift).await;
        self.report("create_shift", result)
    }

    pub async fn change_status(&mut self, id: &ShiftId, to: ShiftStatus) -> BoardResult<()> {
        let result = self.try_change_status(id, to).await;
        self.report("change_status", result)
    }

    pub async fn delete_shift(&mut self, id: &ShiftId) -> BoardResult<()> {
        let result = self.try_delete_shift(id).await;
        self.report("delete_shift", result)
    }

    pub async fn update_shift(&mut self, edited: Shift) -> BoardResult<Shift> {
        let result = self.try_update_shift(edited).await;
        self.report("update_shift", result)
    }

    pub async fn reorder(&mut self, id: &ShiftId, target: ReorderTarget) -> BoardResult<()> {
        let result = self.try_reorder(id, &target).await;
        self.report("reorder", result)
    }

    /// タイマーから呼ばれる。読み込み完了前は何もしない
    pub async fn sweep(&mut self) -> BoardResult<SweepPlan> {
        if self.state != LoadState::Ready {
            return Ok(SweepPlan::default());
        }
        let result = self.try_sweep().await;
        self.report("sweep", result)
    }

    pub async fn import_snapshot(&mut self, json: &str) -> BoardResult<usize> {
        let result = self.try_import_snapshot(json).await;
        self.report("import_snapshot", result)
    }

    pub fn export_snapshot(&self) -> BoardResult<String> {
        let snapshot = ShiftSnapshot {
            shifts: self.shifts.clone(),
        };
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    // =====================
    // 参照
    // =====================

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == LoadState::Ready
    }

    /// コレクション順（並び替え・自動起動の基準になる順序。再読み込み後も同じ）
    pub fn shifts(&self) -> &[Shift] {
        &self.shifts
    }

    /// ステータス優先度で並べた表示順
    pub fn display_shifts(&self) -> Vec<&Shift> {
        display_order(&self.shifts)
    }

    pub fn shift(&self, id: &ShiftId) -> Option<&Shift> {
        self.shifts.iter().find(|s| &s.id == id)
    }

    pub fn error_banner(&self) -> Option<&str> {
        self.error_banner.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error_banner = None;
    }

    pub async fn shifts_with_status(&self, status: ShiftStatus) -> BoardResult<Vec<Shift>> {
        Ok(self.store.get_by_status(status).await?)
    }

    pub async fn shifts_between(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> BoardResult<Vec<Shift>> {
        Ok(self.store.get_by_date_range(start, end).await?)
    }

    // =====================
    // 内部処理
    // =====================

    fn report<T>(&mut self, action: &'static str, result: BoardResult<T>) -> BoardResult<T> {
        if let Err(e) = &result {
            error!(action, error = %e, "shift operation failed");
            self.error_banner = Some(e.to_string());
        }
        result
    }

    fn ensure_ready(&self) -> BoardResult<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(BoardError::NotLoaded)
        }
    }

    /// まとめて永続化する。全件成功した場合のみ Ok
    async fn persist_all(&self, changes: &[Shift]) -> BoardResult<()> {
        for shift in changes {
            self.store.update(shift).await?;
        }
        Ok(())
    }

    fn apply(&mut self, changes: Vec<Shift>) {
        for changed in changes {
            if let Some(slot) = self.shifts.iter_mut().find(|s| s.id == changed.id) {
                *slot = changed;
            }
        }
        sort_sequence(&mut self.shifts);
    }

    async fn try_create_shift(&mut self, new_shift: NewShift) -> BoardResult<Shift> {
        self.ensure_ready()?;
        let shift = Shift::create(new_shift)?;
        self.store.create(&shift).await?;
        debug!(id = %shift.id, "shift created");
        self.shifts.push(shift.clone());
        sort_sequence(&mut self.shifts);
        Ok(shift)
    }

    async fn try_change_status(&mut self, id: &ShiftId, to: ShiftStatus) -> BoardResult<()> {
        self.ensure_ready()?;
        let now = self.clock.now();
        let changes = change_status(&self.shifts, id, to, now)?;
        if changes.is_empty() {
            return Ok(());
        }
        self.persist_all(&changes).await?;
        debug!(id = %id, status = %to, changed = changes.len(), "shift status changed");
        self.apply(changes);
        Ok(())
    }

    async fn try_delete_shift(&mut self, id: &ShiftId) -> BoardResult<()> {
        self.ensure_ready()?;
        self.store.delete(id).await?;
        self.shifts.retain(|s| &s.id != id);
        Ok(())
    }

    async fn try_update_shift(&mut self, edited: Shift) -> BoardResult<Shift> {
        self.ensure_ready()?;
        let existing = self
            .shift(&edited.id)
            .ok_or_else(|| BoardError::ShiftNotFound(edited.id.clone()))?;
        let updated = apply_edit(existing, edited)?;
        self.store.update(&updated).await?;
        self.apply(vec![updated.clone()]);
        Ok(updated)
    }

    async fn try_reorder(&mut self, id: &ShiftId, target: &ReorderTarget) -> BoardResult<()> {
        self.ensure_ready()?;
        let sequence = reorder(&self.shifts, id, target)?;
        self.persist_all(&sequence).await?;
        self.shifts = sequence;
        sort_sequence(&mut self.shifts);
        Ok(())
    }

    async fn try_sweep(&mut self) -> BoardResult<SweepPlan> {
        let now = self.clock.now();
        let plan = sweep(&self.shifts, now)?;
        if plan.is_empty() {
            return Ok(plan);
        }
        self.persist_all(&plan.changes).await?;
        debug!(
            completed = plan.completed.len(),
            activated = ?plan.activated.as_ref().map(ShiftId::as_str),
            "sweep applied"
        );
        self.apply(plan.changes.clone());
        Ok(plan)
    }

    async fn try_import_snapshot(&mut self, json: &str) -> BoardResult<usize> {
        self.ensure_ready()?;
        let snapshot: ShiftSnapshot = serde_json::from_str(json)?;

        let mut seen = HashSet::new();
        let mut shifts = Vec::with_capacity(snapshot.shifts.len());
        for mut shift in snapshot.shifts {
            if !seen.insert(shift.id.clone()) {
                return Err(BoardError::DuplicateSnapshotId(shift.id));
            }
            // duration はファイルの値を信用せず時刻から取り直す
            shift.duration = duration_between(shift.start_time, shift.end_time)?;
            shifts.push(shift);
        }

        let incoming: HashSet<&ShiftId> = shifts.iter().map(|s| &s.id).collect();
        let stale: Vec<ShiftId> = self
            .shifts
            .iter()
            .filter(|s| !incoming.contains(&s.id))
            .map(|s| s.id.clone())
            .collect();

        self.persist_all(&shifts).await?;
        for id in &stale {
            self.store.delete(id).await?;
        }

        info!(imported = shifts.len(), removed = stale.len(), "snapshot imported");
        let count = shifts.len();
        self.shifts = shifts;
        sort_sequence(&mut self.shifts);
        Ok(count)
    }
}
