//! 基于 DashMap 的内存持久化实现
//!
use super::PersistenceStore;
use crate::error::{SyncError, SyncResult};
use crate::model::{EntityId, EntitySnapshot, EntityType};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 内存存储：每个类别一张按标识排序的表
///
/// 克隆共享同一份数据。`set_offline(true)` 可模拟后端不可用，
/// 之后所有操作返回 `SyncError::Store`。
#[derive(Clone, Default)]
pub struct InMemoryStore {
    collections: Arc<DashMap<EntityType, BTreeMap<EntityId, EntitySnapshot>>>,
    offline: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以初始数据构造（同步，便于测试与演示装配）
    pub fn seeded(snapshots: impl IntoIterator<Item = EntitySnapshot>) -> Self {
        let store = Self::new();
        for snapshot in snapshots {
            store.insert(snapshot);
        }
        store
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn len(&self, entity_type: EntityType) -> usize {
        self.collections
            .get(&entity_type)
            .map(|c| c.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.collections.iter().all(|c| c.is_empty())
    }

    fn insert(&self, snapshot: EntitySnapshot) {
        self.collections
            .entry(snapshot.entity_type())
            .or_default()
            .insert(snapshot.id().clone(), snapshot);
    }

    fn ensure_online(&self) -> SyncResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(SyncError::store("in-memory store is offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl PersistenceStore for InMemoryStore {
    async fn load_all(&self, entity_type: EntityType) -> SyncResult<Vec<EntitySnapshot>> {
        self.ensure_online()?;
        Ok(self
            .collections
            .get(&entity_type)
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn load(
        &self,
        entity_type: EntityType,
        id: &EntityId,
    ) -> SyncResult<Option<EntitySnapshot>> {
        self.ensure_online()?;
        Ok(self
            .collections
            .get(&entity_type)
            .and_then(|c| c.get(id).cloned()))
    }

    async fn save(&self, snapshot: EntitySnapshot) -> SyncResult<()> {
        self.ensure_online()?;
        self.insert(snapshot);
        Ok(())
    }

    async fn delete(&self, entity_type: EntityType, id: &EntityId) -> SyncResult<bool> {
        self.ensure_online()?;
        Ok(self
            .collections
            .get_mut(&entity_type)
            .map(|mut c| c.remove(id).is_some())
            .unwrap_or(false))
    }
}
