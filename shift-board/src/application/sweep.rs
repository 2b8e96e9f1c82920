use std::time::Duration;

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::debug;

use crate::application::controller::SharedBoard;

/// 一定間隔で ShiftBoard::sweep を呼ぶタスク
pub struct SweepTask {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl SweepTask {
    pub fn spawn(board: SharedBoard, period: Duration) -> Self {
        let (shutdown, mut stop) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // 最初の tick は即時に完了するので読み捨てる
            ticker.tick().await;

            loop {
                tokio::select! {
                    // 停止要求 or Sender が drop された
                    _ = stop.changed() => break,
                    _ = ticker.tick() => {
                        let mut board = board.lock().await;
                        // 失敗時のログとバナーは sweep 側で処理済み
                        let _ = board.sweep().await;
                    }
                }
            }
            debug!("sweep task stopped");
        });

        Self { shutdown, handle }
    }

    /// 停止してタスクの終了を待つ
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}
