use super::state::{ApplyOutcome, VisibleState};
use crate::event::SyncEvent;
use crate::model::{CommunityPost, EntityId, Ngo, Partner, Resource};
use chrono::{DateTime, Utc};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Inner {
    state: VisibleState,
    last_updated_at: Option<DateTime<Utc>>,
}

/// 对账器：一个消费上下文（访客会话）持有一份可见实体状态
///
/// 写入方只有总线回调与全量同步两处；读取方拿到的都是副本。
#[derive(Debug)]
pub struct Reconciler {
    name: String,
    inner: RwLock<Inner>,
}

impl Reconciler {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: RwLock::new(Inner::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 应用一条事件；状态发生变化时刷新 `last_updated_at`
    pub fn apply(&self, event: &SyncEvent) -> ApplyOutcome {
        let mut inner = self.write();
        let outcome = inner.state.apply(event);
        if outcome.changed() {
            inner.last_updated_at = Some(Utc::now());
        }
        tracing::trace!(
            reconciler = %self.name,
            event = %event.summary(),
            ?outcome,
            "sync event applied"
        );
        outcome
    }

    /// 整体替换（全量同步）
    pub fn replace(&self, state: VisibleState) {
        let mut inner = self.write();
        inner.state = state;
        inner.last_updated_at = Some(Utc::now());
    }

    pub fn snapshot(&self) -> VisibleState {
        self.read().state.clone()
    }

    /// 可见帖子，按创建时间从新到旧
    pub fn visible_posts(&self) -> Vec<CommunityPost> {
        let mut posts: Vec<CommunityPost> = self.read().state.posts().values().cloned().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        posts
    }

    pub fn visible_resources(&self) -> Vec<Resource> {
        self.read().state.resources().values().cloned().collect()
    }

    pub fn visible_partners(&self) -> Vec<Partner> {
        self.read().state.partners().values().cloned().collect()
    }

    pub fn visible_ngos(&self) -> Vec<Ngo> {
        self.read().state.ngos().values().cloned().collect()
    }

    pub fn post(&self, id: &EntityId) -> Option<CommunityPost> {
        self.read().state.posts().get(id).cloned()
    }

    pub fn resource(&self, id: &EntityId) -> Option<Resource> {
        self.read().state.resources().get(id).cloned()
    }

    pub fn partner(&self, id: &EntityId) -> Option<Partner> {
        self.read().state.partners().get(id).cloned()
    }

    pub fn ngo(&self, id: &EntityId) -> Option<Ngo> {
        self.read().state.ngos().get(id).cloned()
    }

    pub fn last_updated_at(&self) -> Option<DateTime<Utc>> {
        self.read().last_updated_at
    }

    /// 本地乐观点赞，不经过总线；下一次全量同步会覆盖
    pub fn like_post(&self, id: &EntityId) -> Option<u32> {
        let mut inner = self.write();
        let post = inner.state.posts_mut().get_mut(id)?;
        post.likes = post.likes.saturating_add(1);
        Some(post.likes)
    }

    /// 本地乐观记录资源浏览
    pub fn record_resource_view(&self, id: &EntityId) -> Option<u32> {
        let mut inner = self.write();
        let resource = inner.state.resources_mut().get_mut(id)?;
        resource.views = resource.views.saturating_add(1);
        Some(resource.views)
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(feature = "eventing")]
impl crate::eventing::SyncHandler for Reconciler {
    fn handler_name(&self) -> &str {
        &self.name
    }

    fn handled_types(&self) -> crate::eventing::TypeFilter {
        crate::eventing::TypeFilter::content()
    }

    fn handle(&self, event: &SyncEvent) -> anyhow::Result<()> {
        self.apply(event);
        Ok(())
    }
}
