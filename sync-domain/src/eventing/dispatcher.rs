//! 派发循环
//!
//! 按 `SyncConfig::dispatch_interval` 周期性排空总线队列；
//! 关闭时先关闭总线（之后的 `emit` 返回 `SyncError::Closed`），
//! 再等待进行中的派发结束并最终排空，已受理的事件不会滞留在队列中。
//!
use super::worker::{WorkerHandle, spawn_periodic};
use super::SyncBus;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

impl SyncBus {
    /// 启动派发循环，返回可用于关闭/等待的句柄
    pub fn spawn_dispatcher(self: &Arc<Self>) -> WorkerHandle {
        let token = CancellationToken::new();
        let interval = self.config().dispatch_interval;

        let bus = self.clone();
        let ticker = spawn_periodic(token.clone(), interval, true, move || {
            let bus = bus.clone();
            async move {
                bus.flush();
            }
        });

        // 关闭后的最终排空
        let bus = self.clone();
        let stop = token.clone();
        let drain = tokio::spawn(async move {
            stop.cancelled().await;
            bus.close();
            let remaining = bus.drain();
            tracing::debug!(remaining, "sync dispatcher stopped");
        });

        tracing::debug!(interval_ms = interval.as_millis() as u64, "sync dispatcher started");
        WorkerHandle::new(token, vec![ticker, drain])
    }
}
