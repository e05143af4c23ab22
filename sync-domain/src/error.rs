//! 同步层统一错误定义
//!
//! 覆盖事件构造校验、总线背压、持久化与解析等最小必要集合。
//! 订阅者回调失败不在此列：它们在派发处被捕获并记录，不向生产者传播。
//!
use crate::model::{EntityId, EntityType};
use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SyncError {
    // --- 序列化/解析 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
    #[error("parse error: {reason}")]
    Parse { reason: String },

    // --- 事件系统 ---
    #[error("event bus busy: queue capacity {capacity} reached")]
    Busy { capacity: usize },
    #[error("event bus closed")]
    Closed,
    #[error("invalid event: {reason}")]
    InvalidEvent { reason: String },

    // --- 持久化 ---
    #[error("store error: {reason}")]
    Store { reason: String },
    #[error("not found: type={entity_type}, id={id}")]
    NotFound { entity_type: EntityType, id: EntityId },
}

impl SyncError {
    pub fn store(reason: impl Into<String>) -> Self {
        SyncError::Store {
            reason: reason.into(),
        }
    }

    pub fn invalid_event(reason: impl Into<String>) -> Self {
        SyncError::InvalidEvent {
            reason: reason.into(),
        }
    }
}

/// 统一 Result 类型别名
pub type SyncResult<T> = Result<T, SyncError>;

impl From<std::num::ParseIntError> for SyncError {
    fn from(err: std::num::ParseIntError) -> Self {
        SyncError::Parse {
            reason: err.to_string(),
        }
    }
}
