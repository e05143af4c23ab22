use sync_domain::SyncError;
use sync_domain::model::{EntityId, EntityType};

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("domain: {0}")]
    Domain(#[from] SyncError),

    #[error("validation: {0}")]
    Validation(String),

    #[error("entity not found: type={entity_type}, id={id}")]
    NotFound { entity_type: EntityType, id: EntityId },

    /// 写入持久化存储失败：此时不会发出任何事件
    #[error("store write failed: type={entity_type}, id={id}: {source}")]
    StoreWrite {
        entity_type: EntityType,
        id: EntityId,
        #[source]
        source: SyncError,
    },
}

impl AppError {
    pub(crate) fn not_found(entity_type: EntityType, id: &EntityId) -> Self {
        AppError::NotFound {
            entity_type,
            id: id.clone(),
        }
    }

    pub(crate) fn store_write(entity_type: EntityType, id: &EntityId, source: SyncError) -> Self {
        AppError::StoreWrite {
            entity_type,
            id: id.clone(),
            source,
        }
    }
}
