//! 持久化协议（persist）
//!
//! 规范数据的唯一来源。同步层只要求四个能力：
//! - 按类别加载全部实体（全量同步使用，结果不经可见性过滤）；
//! - 按标识加载单个实体；
//! - 保存（新增或整体替换）；
//! - 删除。
//!
//! 具体后端由上层注入；`InMemoryStore` 用于测试与演示。
//!
mod store_inmemory;

pub use store_inmemory::InMemoryStore;

use crate::error::SyncResult;
use crate::model::{EntityId, EntitySnapshot, EntityType, SyncEntity};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait PersistenceStore: Send + Sync {
    /// 加载某类别的全部实体（含不可见实体）
    async fn load_all(&self, entity_type: EntityType) -> SyncResult<Vec<EntitySnapshot>>;

    async fn load(&self, entity_type: EntityType, id: &EntityId)
    -> SyncResult<Option<EntitySnapshot>>;

    /// 新增或整体替换
    async fn save(&self, snapshot: EntitySnapshot) -> SyncResult<()>;

    /// 删除；返回实体此前是否存在
    async fn delete(&self, entity_type: EntityType, id: &EntityId) -> SyncResult<bool>;
}

#[async_trait]
impl<T> PersistenceStore for Arc<T>
where
    T: PersistenceStore + ?Sized,
{
    async fn load_all(&self, entity_type: EntityType) -> SyncResult<Vec<EntitySnapshot>> {
        (**self).load_all(entity_type).await
    }

    async fn load(
        &self,
        entity_type: EntityType,
        id: &EntityId,
    ) -> SyncResult<Option<EntitySnapshot>> {
        (**self).load(entity_type, id).await
    }

    async fn save(&self, snapshot: EntitySnapshot) -> SyncResult<()> {
        (**self).save(snapshot).await
    }

    async fn delete(&self, entity_type: EntityType, id: &EntityId) -> SyncResult<bool> {
        (**self).delete(entity_type, id).await
    }
}

/// 强类型便捷方法
#[async_trait]
pub trait PersistenceStoreExt: PersistenceStore {
    async fn load_entity<E: SyncEntity>(&self, id: &EntityId) -> SyncResult<Option<E>> {
        Ok(self
            .load(E::ENTITY_TYPE, id)
            .await?
            .and_then(E::from_snapshot))
    }

    async fn load_all_entities<E: SyncEntity>(&self) -> SyncResult<Vec<E>> {
        Ok(self
            .load_all(E::ENTITY_TYPE)
            .await?
            .into_iter()
            .filter_map(E::from_snapshot)
            .collect())
    }

    async fn save_entity<E: SyncEntity>(&self, entity: E) -> SyncResult<()> {
        self.save(entity.into()).await
    }
}

impl<T> PersistenceStoreExt for T where T: PersistenceStore + ?Sized {}
