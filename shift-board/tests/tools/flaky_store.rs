use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use shift_board::domain::{Shift, ShiftId, ShiftStatus, Timestamp};
use shift_board::infrastructure::{ShiftStore, SqliteShiftStore, StoreError, StoreResult};

/// 指定回数の書き込み後に失敗するストア
pub struct FlakyStore {
    inner: SqliteShiftStore,
    writes_left: AtomicUsize,
    fail_reads: AtomicBool,
}

impl FlakyStore {
    pub async fn new() -> Self {
        Self {
            inner: SqliteShiftStore::in_memory().await.expect("Failed to open store"),
            writes_left: AtomicUsize::new(usize::MAX),
            fail_reads: AtomicBool::new(false),
        }
    }

    pub fn inner(&self) -> &SqliteShiftStore {
        &self.inner
    }

    /// n 回書き込みに成功したあと失敗させる
    pub fn fail_writes_after(&self, n: usize) {
        self.writes_left.store(n, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn write_permit(&self) -> StoreResult<()> {
        let left = self.writes_left.load(Ordering::SeqCst);
        if left == 0 {
            return Err(StoreError::Io(std::io::Error::other("injected write failure")));
        }
        self.writes_left.store(left - 1, Ordering::SeqCst);
        Ok(())
    }

    fn read_permit(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("injected read failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl ShiftStore for FlakyStore {
    async fn get_all(&self) -> StoreResult<Vec<Shift>> {
        self.read_permit()?;
        self.inner.get_all().await
    }

    async fn create(&self, shift: &Shift) -> StoreResult<()> {
        self.write_permit()?;
        self.inner.create(shift).await
    }

    async fn update(&self, shift: &Shift) -> StoreResult<()> {
        self.write_permit()?;
        self.inner.update(shift).await
    }

    async fn delete(&self, id: &ShiftId) -> StoreResult<()> {
        self.write_permit()?;
        self.inner.delete(id).await
    }

    async fn get_by_id(&self, id: &ShiftId) -> StoreResult<Option<Shift>> {
        self.read_permit()?;
        self.inner.get_by_id(id).await
    }

    async fn get_by_status(&self, status: ShiftStatus) -> StoreResult<Vec<Shift>> {
        self.read_permit()?;
        self.inner.get_by_status(status).await
    }

    async fn get_by_date_range(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> StoreResult<Vec<Shift>> {
        self.read_permit()?;
        self.inner.get_by_date_range(start, end).await
    }
}
