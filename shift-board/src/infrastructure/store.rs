use async_trait::async_trait;
use shift_lifecycle::{Shift, ShiftId, ShiftStatus, Timestamp};

use crate::infrastructure::error::StoreResult;

/// シフトの永続化ストア
///
/// 実装は差し替え可能で、コントローラはどの実装が動いているかを知らない。
#[async_trait]
pub trait ShiftStore: Send + Sync {
    /// 全件 (start_time 昇順、同時刻は登録順)
    async fn get_all(&self) -> StoreResult<Vec<Shift>>;

    /// 同じ id が既にあれば DuplicateId
    async fn create(&self, shift: &Shift) -> StoreResult<()>;

    /// id による upsert
    async fn update(&self, shift: &Shift) -> StoreResult<()>;

    /// 存在しない id は何もしない
    async fn delete(&self, id: &ShiftId) -> StoreResult<()>;

    async fn get_by_id(&self, id: &ShiftId) -> StoreResult<Option<Shift>>;

    async fn get_by_status(&self, status: ShiftStatus) -> StoreResult<Vec<Shift>>;

    /// start <= start_time <= end
    async fn get_by_date_range(&self, start: Timestamp, end: Timestamp) -> StoreResult<Vec<Shift>>;
}
