use std::sync::Arc;
use std::time::Duration;

use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info};

pub mod application;
pub mod domain;
pub mod infrastructure;

use application::config::{BoardConfig, StorageConfig};
use application::controller::{SharedBoard, ShiftBoard};
use application::sweep::SweepTask;
use domain::clock::{Clock, SystemClock};
use infrastructure::{FallbackShiftStore, JsonFileShiftStore, ShiftStore, SqliteShiftStore};

/// 起動時に1度だけ組み立てるストア・コントローラ・sweep タスクのコンテナ
pub struct App {
    board: SharedBoard,
    sweep: SweepTask,
    shutdown: watch::Sender<bool>,
    load: Option<JoinHandle<()>>,
}

impl App {
    /// 主ストア (SQLite) が開けなければ副ストア (JSON) だけで動く
    pub async fn build_store(config: &StorageConfig) -> Arc<FallbackShiftStore> {
        let secondary = Arc::new(JsonFileShiftStore::new(&config.fallback_path));
        let primary = SqliteShiftStore::connect(&config.database_url);
        let store = FallbackShiftStore::initialize(primary, secondary).await;
        info!(degraded = store.is_degraded(), "shift store initialized");
        Arc::new(store)
    }

    pub async fn start(config: &BoardConfig) -> Self {
        let store = Self::build_store(&config.storage).await;
        Self::with_store(store, Arc::new(SystemClock), config.sweep.interval())
    }

    /// 初回読み込みと sweep タスクを起動する
    pub fn with_store(
        store: Arc<dyn ShiftStore>,
        clock: Arc<dyn Clock>,
        sweep_interval: Duration,
    ) -> Self {
        let board = ShiftBoard::new(store, clock).into_shared();
        let (shutdown, mut stop) = watch::channel(false);

        let loading = board.clone();
        let load = tokio::spawn(async move {
            let mut board = loading.lock().await;
            tokio::select! {
                // 結果はボードの LoadState に反映済み
                _ = board.load() => {}
                // 終了後に読み込み結果を反映させない
                _ = stop.changed() => debug!("initial load cancelled"),
            }
        });

        let sweep = SweepTask::spawn(board.clone(), sweep_interval);

        Self {
            board,
            sweep,
            shutdown,
            load: Some(load),
        }
    }

    pub fn board(&self) -> SharedBoard {
        self.board.clone()
    }

    /// 初回読み込みの完了を待つ
    pub async fn wait_for_load(&mut self) {
        if let Some(load) = self.load.take() {
            let _ = load.await;
        }
    }

    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        self.wait_for_load().await;
        self.sweep.shutdown().await;
        info!("shift board stopped");
    }
}
