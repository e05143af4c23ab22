//! 事件子系统（eventing）
//!
//! 单进程内的同步事件总线与其运行时：
//! - `SyncBus`：`emit` 入队（非阻塞），`subscribe` 注册回调，`flush` 按 FIFO 排空队列；
//! - `SyncHandler`：以 trait 对象形式订阅（名称 + 关心的类型 + 处理逻辑）；
//! - `Subscription`：注销句柄，可重复调用、可在回调内调用；
//! - `WorkerHandle`：派发循环与周期任务的关闭/等待句柄。
//!
mod bus;
mod dispatcher;
mod handler;
mod registry;
mod worker;

pub use bus::{BusStats, SyncBus};
pub use handler::{SyncHandler, TypeFilter};
pub use registry::Subscription;
pub use worker::WorkerHandle;

pub(crate) use worker::spawn_periodic;
