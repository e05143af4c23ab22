use super::{SyncAction, SyncPayload};
use crate::error::{SyncError, SyncResult};
use crate::model::{EntityId, EntitySnapshot, EntityType, SyncEntity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 生产者提交的事件（尚未由总线盖戳）
#[derive(Debug, Clone, PartialEq)]
pub struct NewSyncEvent {
    action: SyncAction,
    payload: SyncPayload,
    origin_id: Option<String>,
}

#[bon::bon]
impl NewSyncEvent {
    /// 构造并校验：创建/更新/发布必须携带完整快照
    #[builder]
    pub fn new(
        action: SyncAction,
        #[builder(into)] payload: SyncPayload,
        origin_id: Option<String>,
    ) -> SyncResult<Self> {
        if action.requires_snapshot() && payload.snapshot().is_none() {
            return Err(SyncError::invalid_event(format!(
                "{action} on {}:{} requires a full snapshot",
                payload.entity_type(),
                payload.id()
            )));
        }
        if payload.id().is_blank() {
            return Err(SyncError::invalid_event(format!(
                "{action} on {} carries a blank id",
                payload.entity_type()
            )));
        }

        Ok(Self {
            action,
            payload,
            origin_id,
        })
    }
}

impl NewSyncEvent {
    /// 以实体快照构造事件
    pub fn for_entity<E: SyncEntity>(action: SyncAction, entity: E) -> SyncResult<Self> {
        let snapshot: EntitySnapshot = entity.into();
        Self::builder().action(action).payload(snapshot).build()
    }

    /// 删除事件：仅携带标识
    pub fn removed(entity_type: EntityType, id: impl Into<EntityId>) -> SyncResult<Self> {
        Self::builder()
            .action(SyncAction::Delete)
            .payload(SyncPayload::Removed {
                entity_type,
                id: id.into(),
            })
            .build()
    }

    pub fn with_origin(mut self, origin_id: impl Into<String>) -> Self {
        self.origin_id = Some(origin_id.into());
        self
    }

    pub fn action(&self) -> SyncAction {
        self.action
    }

    pub fn entity_type(&self) -> EntityType {
        self.payload.entity_type()
    }

    pub fn payload(&self) -> &SyncPayload {
        &self.payload
    }

    pub fn origin_id(&self) -> Option<&str> {
        self.origin_id.as_deref()
    }

    /// 盖戳：分配事件 ID、发出序号与发生时间，之后事件不可变
    pub fn stamp(self, sequence: u64) -> SyncEvent {
        SyncEvent {
            event_id: Uuid::new_v4(),
            entity_type: self.payload.entity_type(),
            action: self.action,
            payload: self.payload,
            sequence,
            occurred_at: Utc::now(),
            origin_id: self.origin_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncEvent {
    /// 事件唯一标识，用于日志关联
    event_id: Uuid,
    entity_type: EntityType,
    action: SyncAction,
    payload: SyncPayload,
    /// 总线内单调递增的发出序号（仅作排序提示，不参与冲突裁决）
    sequence: u64,
    occurred_at: DateTime<Utc>,
    /// 触发变更的管理员，仅用于审计与调试
    origin_id: Option<String>,
}

impl SyncEvent {
    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    pub fn action(&self) -> SyncAction {
        self.action
    }

    pub fn payload(&self) -> &SyncPayload {
        &self.payload
    }

    pub fn entity_id(&self) -> &EntityId {
        self.payload.id()
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn origin_id(&self) -> Option<&str> {
        self.origin_id.as_deref()
    }

    /// 日志用摘要，如 `#12 resource:update:r1`
    pub fn summary(&self) -> String {
        format!(
            "#{} {}:{}:{}",
            self.sequence,
            self.entity_type,
            self.action,
            self.payload.id()
        )
    }
}
