use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::{fs, sync::Mutex};

use shift_lifecycle::{sort_sequence, Shift, ShiftId, ShiftStatus, Timestamp};

use crate::infrastructure::error::{StoreError, StoreResult};
use crate::infrastructure::store::ShiftStore;

/// 副ストア: 1つのキー (ファイル) に全件を JSON で置く。検索は全件走査
pub struct JsonFileShiftStore {
    path: PathBuf,
    // 読み込み -> 書き戻しの間に他の操作を挟ませない
    lock: Mutex<()>,
}

#[derive(Default, Serialize, Deserialize)]
struct FlatDb {
    #[serde(default)]
    shifts: Vec<Shift>,
}

impl JsonFileShiftStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> StoreResult<FlatDb> {
        match fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(FlatDb::default()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            // 未作成なら空
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(FlatDb::default()),
            Err(e) => Err(StoreError::from(e)),
        }
    }

    async fn write(&self, db: &FlatDb) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string(db)?;
        fs::write(&self.path, json).await?;
        Ok(())
    }

    async fn scan<F>(&self, keep: F) -> StoreResult<Vec<Shift>>
    where
        F: Fn(&Shift) -> bool + Send,
    {
        let _guard = self.lock.lock().await;
        let mut shifts: Vec<Shift> = self
            .read()
            .await?
            .shifts
            .into_iter()
            .filter(|s| keep(s))
            .collect();
        sort_sequence(&mut shifts);
        Ok(shifts)
    }
}

/// SQLite 側の CHECK 制約と同じ条件
fn check_record(shift: &Shift) -> StoreResult<()> {
    if shift.has_valid_range() {
        Ok(())
    } else {
        Err(StoreError::ConstraintViolation(shift.id.clone()))
    }
}

#[async_trait]
impl ShiftStore for JsonFileShiftStore {
    async fn get_all(&self) -> StoreResult<Vec<Shift>> {
        self.scan(|_| true).await
    }

    async fn create(&self, shift: &Shift) -> StoreResult<()> {
        check_record(shift)?;
        let _guard = self.lock.lock().await;
        let mut db = self.read().await?;
        if db.shifts.iter().any(|s| s.id == shift.id) {
            return Err(StoreError::DuplicateId(shift.id.clone()));
        }
        db.shifts.push(shift.clone());
        self.write(&db).await
    }

    async fn update(&self, shift: &Shift) -> StoreResult<()> {
        check_record(shift)?;
        let _guard = self.lock.lock().await;
        let mut db = self.read().await?;
        match db.shifts.iter_mut().find(|s| s.id == shift.id) {
            Some(existing) => *existing = shift.clone(),
            None => db.shifts.push(shift.clone()),
        }
        self.write(&db).await
    }

    async fn delete(&self, id: &ShiftId) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        let mut db = self.read().await?;
        let before = db.shifts.len();
        db.shifts.retain(|s| &s.id != id);
        if db.shifts.len() == before {
            return Ok(());
        }
        self.write(&db).await
    }

    async fn get_by_id(&self, id: &ShiftId) -> StoreResult<Option<Shift>> {
        let _guard = self.lock.lock().await;
        Ok(self.read().await?.shifts.into_iter().find(|s| &s.id == id))
    }

    async fn get_by_status(&self, status: ShiftStatus) -> StoreResult<Vec<Shift>> {
        self.scan(move |s| s.status == status).await
    }

    async fn get_by_date_range(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> StoreResult<Vec<Shift>> {
        self.scan(move |s| s.start_time >= start && s.start_time <= end).await
    }
}
