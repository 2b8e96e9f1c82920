use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use shift_lifecycle::{Shift, ShiftId, ShiftStatus, Timestamp};

use crate::infrastructure::error::{StoreError, StoreResult};
use crate::infrastructure::store::ShiftStore;

/// 主ストアが使えない場合に副ストアへ切り替えるストア
///
/// ```text
///  primary ok ──> primary
///  primary err ─> switch (以後 primary は使わない) ─> secondary で再実行
///  secondary err ────────────────────────────────> 呼び出し元へ
/// ```
pub struct FallbackShiftStore {
    primary: Option<Arc<dyn ShiftStore>>,
    secondary: Arc<dyn ShiftStore>,
    degraded: AtomicBool,
}

// 主ストアで実行し、使用不能なら切り替えて副ストアで同じ呼び出しをやり直す
macro_rules! with_fallback {
    ($self:ident, $op:literal, |$store:ident| $call:expr) => {{
        if let Some($store) = $self.active_primary() {
            match $call.await {
                Ok(value) => return Ok(value),
                Err(e) if e.triggers_fallback() => $self.switch_to_secondary($op, &e),
                Err(e) => return Err(e),
            }
        }
        let $store = &$self.secondary;
        $call.await
    }};
}

impl FallbackShiftStore {
    pub fn new(primary: Arc<dyn ShiftStore>, secondary: Arc<dyn ShiftStore>) -> Self {
        Self {
            primary: Some(primary),
            secondary,
            degraded: AtomicBool::new(false),
        }
    }

    pub fn secondary_only(secondary: Arc<dyn ShiftStore>) -> Self {
        Self {
            primary: None,
            secondary,
            degraded: AtomicBool::new(true),
        }
    }

    /// 主ストアの初期化に失敗しても呼び出し元にはエラーを返さない
    pub async fn initialize<P, Fut>(primary: Fut, secondary: Arc<dyn ShiftStore>) -> Self
    where
        P: ShiftStore + 'static,
        Fut: Future<Output = StoreResult<P>>,
    {
        match primary.await {
            Ok(store) => Self::new(Arc::new(store), secondary),
            Err(e) => {
                warn!(error = %e, "primary shift store unavailable, using fallback store");
                Self::secondary_only(secondary)
            }
        }
    }

    /// 副ストアで動作中か
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    fn active_primary(&self) -> Option<&Arc<dyn ShiftStore>> {
        if self.is_degraded() {
            None
        } else {
            self.primary.as_ref()
        }
    }

    fn switch_to_secondary(&self, op: &'static str, error: &StoreError) {
        if !self.degraded.swap(true, Ordering::AcqRel) {
            warn!(op, error = %error, "primary shift store failed, switching to fallback store");
            info!("fallback store stays active for the rest of the session");
        }
    }
}

#[async_trait]
impl ShiftStore for FallbackShiftStore {
    async fn get_all(&self) -> StoreResult<Vec<Shift>> {
        with_fallback!(self, "get_all", |store| store.get_all())
    }

    async fn create(&self, shift: &Shift) -> StoreResult<()> {
        with_fallback!(self, "create", |store| store.create(shift))
    }

    async fn update(&self, shift: &Shift) -> StoreResult<()> {
        with_fallback!(self, "update", |store| store.update(shift))
    }

    async fn delete(&self, id: &ShiftId) -> StoreResult<()> {
        with_fallback!(self, "delete", |store| store.delete(id))
    }

    async fn get_by_id(&self, id: &ShiftId) -> StoreResult<Option<Shift>> {
        with_fallback!(self, "get_by_id", |store| store.get_by_id(id))
    }

    async fn get_by_status(&self, status: ShiftStatus) -> StoreResult<Vec<Shift>> {
        with_fallback!(self, "get_by_status", |store| store.get_by_status(status))
    }

    async fn get_by_date_range(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> StoreResult<Vec<Shift>> {
        with_fallback!(self, "get_by_date_range", |store| store
            .get_by_date_range(start, end))
    }
}
