//! 门户同步层应用服务（sync-application）
//!
//! - `ContentAdmin`：生产者，先写持久化存储，写入成功后才发出同步事件；
//! - `ViewerSession`：消费上下文，持有对账器、总线订阅与周期全量同步的生命周期。
//!
pub mod admin;
pub mod context;
pub mod error;
pub mod session;

pub use admin::{ContentAdmin, MutationReceipt};
pub use context::AdminContext;
pub use error::AppError;
pub use session::ViewerSession;
