//! 同步事件（SyncEvent）模型
//!
//! 描述“什么发生了变化”的带标签联合：
//! - `SyncAction`：创建/更新/删除/发布/下线；
//! - `SyncPayload`：完整的强类型快照，或仅标识（删除）；
//! - `NewSyncEvent`：生产者提交的、尚未盖戳的事件，构造时校验动作与载荷的匹配；
//! - `SyncEvent`：总线盖戳（序号、时间、事件 ID）后的不可变事件。
//!
mod action;
mod payload;
mod sync_event;

pub use action::SyncAction;
pub use payload::SyncPayload;
pub use sync_event::{NewSyncEvent, SyncEvent};
