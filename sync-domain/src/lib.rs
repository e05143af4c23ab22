//! 门户实时同步层领域库（sync-domain）
//!
//! 将管理员对内容（社区帖子、资源、合作伙伴、NGO）的变更，在同一进程内
//! 传播到每个在线访客会话的只读内存视图：
//! - 实体与事件模型（`model`、`event`）：带类型的快照与变更动作；
//! - 事件总线（`eventing`）：订阅注册表、类型过滤、FIFO 定时派发与故障隔离；
//! - 对账（`reconcile`）：幂等地把事件折叠进“可见实体”映射，并周期全量覆盖自愈；
//! - 持久化协议（`persist`）：规范数据的加载/保存接口与内存实现。
//!
//! 典型用法：
//! 1. 构造 `SyncBus` 并调用 `spawn_dispatcher` 启动派发循环；
//! 2. 生产者写入 `PersistenceStore` 成功后调用 `SyncBus::emit`；
//! 3. 每个消费上下文持有一个 `Reconciler`，订阅总线并启动 `ResyncScheduler`。
//!
pub mod config;
pub mod error;
pub mod event;
#[cfg(feature = "eventing")]
pub mod eventing;
pub mod model;
pub mod persist;
pub mod reconcile;

pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};

// 允许在本 crate 内部通过 ::sync_domain 进行自引用，
// 以便过程宏生成的路径在本 crate 中也能解析。
extern crate self as sync_domain;
