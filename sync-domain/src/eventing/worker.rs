//! 周期任务与运行句柄
//!
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// 启动周期任务：每个 tick 调用一次 `f`，取消令牌触发后退出。
///
/// `start_immediately` 为 false 时首个 tick 推迟一个间隔。
/// 错过的 tick 直接跳过，不做补偿。
pub(crate) fn spawn_periodic<F, Fut>(
    token: CancellationToken,
    interval: Duration,
    start_immediately: bool,
    mut f: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let interval = interval.max(Duration::from_millis(1));

    tokio::spawn(async move {
        let mut ticker = if start_immediately {
            time::interval(interval)
        } else {
            time::interval_at(Instant::now() + interval, interval)
        };
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => f().await,
            }
        }
    })
}

/// 运行句柄：用于优雅关闭与等待任务结束；丢弃时自动发出关闭信号
pub struct WorkerHandle {
    token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl WorkerHandle {
    pub(crate) fn new(token: CancellationToken, tasks: Vec<JoinHandle<()>>) -> Self {
        Self { token, tasks }
    }

    pub fn shutdown(&self) {
        self.token.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn join(mut self) {
        let tasks = std::mem::take(&mut self.tasks);

        for t in tasks {
            if let Err(err) = t.await {
                tracing::warn!(error = %err, "sync worker task ended abnormally");
            }
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
