//! 对账（reconcile）
//!
//! - `VisibleState`：可见实体映射与幂等应用算法；
//! - `Reconciler`：带读写锁的状态持有者，可作为 `SyncHandler` 订阅总线；
//! - `resync_once` / `ResyncScheduler`：从持久化存储整体替换状态。
//!
mod reconciler;
mod resync;
mod state;

pub use reconciler::Reconciler;
#[cfg(feature = "eventing")]
pub use resync::ResyncScheduler;
pub use resync::resync_once;
pub use state::{ApplyOutcome, VisibleState};
