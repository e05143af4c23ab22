//! 管理端变更服务（生产者）
//!
//! 每个变更都遵循同一顺序：构造并校验事件 → 写入持久化存储 → 发出事件。
//! 存储写入失败时直接返回错误，不发出任何事件。
//! 写入成功后若总线拒绝（队列已满），变更本身仍然成功，
//! 回执中 `sequence` 为空，访客视图由下一次全量同步修复。
//!
use crate::context::AdminContext;
use crate::error::AppError;
use serde::Serialize;
use std::sync::Arc;
use sync_domain::event::{NewSyncEvent, SyncAction, SyncPayload};
use sync_domain::eventing::SyncBus;
use sync_domain::model::{EntityId, EntityType, PortalSettings, SyncEntity, UserAccount, UserRole};
use sync_domain::persist::{PersistenceStore, PersistenceStoreExt};

/// 变更回执
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationReceipt {
    pub entity_type: EntityType,
    pub id: EntityId,
    pub action: SyncAction,
    /// 总线分配的序号；为空表示写入成功但事件未能入队
    pub sequence: Option<u64>,
}

impl MutationReceipt {
    pub fn emitted(&self) -> bool {
        self.sequence.is_some()
    }
}

#[derive(Clone)]
pub struct ContentAdmin {
    store: Arc<dyn PersistenceStore>,
    bus: Arc<SyncBus>,
}

impl ContentAdmin {
    pub fn new(store: Arc<dyn PersistenceStore>, bus: Arc<SyncBus>) -> Self {
        Self { store, bus }
    }

    /// 新增实体；同类别内标识已存在时拒绝
    pub async fn create<E: SyncEntity>(
        &self,
        ctx: &AdminContext,
        entity: E,
    ) -> Result<MutationReceipt, AppError> {
        let event = NewSyncEvent::for_entity(SyncAction::Create, entity)?;
        if self.store.load(E::ENTITY_TYPE, event.payload().id()).await?.is_some() {
            return Err(AppError::Validation(format!(
                "{} {} already exists",
                E::ENTITY_TYPE,
                event.payload().id()
            )));
        }
        self.commit(ctx, event).await
    }

    /// 整体替换已存在的实体（包括可见性字段）
    pub async fn update<E: SyncEntity>(
        &self,
        ctx: &AdminContext,
        entity: E,
    ) -> Result<MutationReceipt, AppError> {
        let event = NewSyncEvent::for_entity(SyncAction::Update, entity)?;
        self.ensure_exists(E::ENTITY_TYPE, event.payload().id()).await?;
        self.commit(ctx, event).await
    }

    pub async fn publish<E: SyncEntity>(
        &self,
        ctx: &AdminContext,
        id: &EntityId,
    ) -> Result<MutationReceipt, AppError> {
        self.toggle_visibility::<E>(ctx, id, true).await
    }

    pub async fn unpublish<E: SyncEntity>(
        &self,
        ctx: &AdminContext,
        id: &EntityId,
    ) -> Result<MutationReceipt, AppError> {
        self.toggle_visibility::<E>(ctx, id, false).await
    }

    pub async fn delete<E: SyncEntity>(
        &self,
        ctx: &AdminContext,
        id: &EntityId,
    ) -> Result<MutationReceipt, AppError> {
        let event = NewSyncEvent::removed(E::ENTITY_TYPE, id.clone())?;
        self.commit(ctx, event).await
    }

    pub async fn change_user_role(
        &self,
        ctx: &AdminContext,
        id: &EntityId,
        role: UserRole,
    ) -> Result<MutationReceipt, AppError> {
        let mut user: UserAccount = self
            .store
            .load_entity(id)
            .await?
            .ok_or_else(|| AppError::not_found(EntityType::User, id))?;
        user.role = role;
        let event = NewSyncEvent::for_entity(SyncAction::Update, user)?;
        self.commit(ctx, event).await
    }

    /// 保存门户设置（不存在时即创建）
    pub async fn update_settings(
        &self,
        ctx: &AdminContext,
        settings: PortalSettings,
    ) -> Result<MutationReceipt, AppError> {
        if settings.site_name.trim().is_empty() {
            return Err(AppError::Validation("site name must not be empty".into()));
        }
        let event = NewSyncEvent::for_entity(SyncAction::Update, settings)?;
        self.commit(ctx, event).await
    }

    async fn toggle_visibility<E: SyncEntity>(
        &self,
        ctx: &AdminContext,
        id: &EntityId,
        visible: bool,
    ) -> Result<MutationReceipt, AppError> {
        let mut entity: E = self
            .store
            .load_entity(id)
            .await?
            .ok_or_else(|| AppError::not_found(E::ENTITY_TYPE, id))?;
        entity.set_visible(visible);

        let action = if visible {
            SyncAction::Publish
        } else {
            SyncAction::Unpublish
        };
        let event = NewSyncEvent::for_entity(action, entity)?;
        self.commit(ctx, event).await
    }

    async fn ensure_exists(&self, entity_type: EntityType, id: &EntityId) -> Result<(), AppError> {
        match self.store.load(entity_type, id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::not_found(entity_type, id)),
        }
    }

    /// 写入存储，成功后发出事件
    async fn commit(
        &self,
        ctx: &AdminContext,
        event: NewSyncEvent,
    ) -> Result<MutationReceipt, AppError> {
        let entity_type = event.entity_type();
        let action = event.action();
        let id = event.payload().id().clone();

        match event.payload() {
            SyncPayload::Snapshot(snapshot) => self
                .store
                .save(snapshot.clone())
                .await
                .map_err(|err| AppError::store_write(entity_type, &id, err))?,
            SyncPayload::Removed { .. } => {
                let existed = self
                    .store
                    .delete(entity_type, &id)
                    .await
                    .map_err(|err| AppError::store_write(entity_type, &id, err))?;
                if !existed {
                    return Err(AppError::not_found(entity_type, &id));
                }
            }
        }

        let sequence = match self.bus.emit(event.with_origin(ctx.admin_id.clone())) {
            Ok(sequence) => Some(sequence),
            Err(err) => {
                tracing::warn!(
                    admin = %ctx.admin_id,
                    request = ctx.request_id.as_deref().unwrap_or("-"),
                    %entity_type,
                    %action,
                    %id,
                    error = %err,
                    "mutation stored but sync event was not emitted"
                );
                None
            }
        };

        tracing::info!(
            admin = %ctx.admin_id,
            request = ctx.request_id.as_deref().unwrap_or("-"),
            %entity_type,
            %action,
            %id,
            ?sequence,
            "content mutation committed"
        );

        Ok(MutationReceipt {
            entity_type,
            id,
            action,
            sequence,
        })
    }
}
