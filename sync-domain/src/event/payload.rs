use crate::model::{EntityId, EntitySnapshot, EntityType};
use serde::{Deserialize, Serialize};

/// 事件载荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPayload {
    /// 完整实体快照（创建/更新/发布/下线）
    Snapshot(EntitySnapshot),
    /// 仅实体标识（删除，或不关心内容的下线）
    Removed { entity_type: EntityType, id: EntityId },
}

impl SyncPayload {
    pub fn entity_type(&self) -> EntityType {
        match self {
            SyncPayload::Snapshot(snapshot) => snapshot.entity_type(),
            SyncPayload::Removed { entity_type, .. } => *entity_type,
        }
    }

    pub fn id(&self) -> &EntityId {
        match self {
            SyncPayload::Snapshot(snapshot) => snapshot.id(),
            SyncPayload::Removed { id, .. } => id,
        }
    }

    /// 快照中的可见性；仅标识的载荷没有可见性
    pub fn visibility(&self) -> Option<bool> {
        match self {
            SyncPayload::Snapshot(snapshot) => Some(snapshot.is_visible()),
            SyncPayload::Removed { .. } => None,
        }
    }

    pub fn snapshot(&self) -> Option<&EntitySnapshot> {
        match self {
            SyncPayload::Snapshot(snapshot) => Some(snapshot),
            SyncPayload::Removed { .. } => None,
        }
    }
}

impl From<EntitySnapshot> for SyncPayload {
    fn from(snapshot: EntitySnapshot) -> Self {
        SyncPayload::Snapshot(snapshot)
    }
}
