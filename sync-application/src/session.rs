//! 访客会话（消费上下文）
//!
//! 打开时：注册对账器为总线订阅者 → 立即执行一次全量同步 → 启动周期全量同步。
//! 关闭时（显式 `close` 或丢弃）：注销订阅并停止周期任务。
//!
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use sync_domain::SyncResult;
use sync_domain::eventing::{Subscription, SyncBus, WorkerHandle};
use sync_domain::model::{CommunityPost, EntityId, Ngo, Partner, Resource};
use sync_domain::persist::PersistenceStore;
use sync_domain::reconcile::{Reconciler, ResyncScheduler, resync_once};

pub struct ViewerSession {
    session_id: String,
    reconciler: Arc<Reconciler>,
    store: Arc<dyn PersistenceStore>,
    subscription: Subscription,
    resync: WorkerHandle,
    closed: AtomicBool,
}

impl ViewerSession {
    /// 打开会话；首次全量同步失败只记录日志，会话以空视图开始
    pub async fn open(
        session_id: impl Into<String>,
        bus: &Arc<SyncBus>,
        store: Arc<dyn PersistenceStore>,
    ) -> Self {
        let session_id = session_id.into();
        let reconciler = Arc::new(Reconciler::new(session_id.clone()));
        let subscription = bus.subscribe_handler(reconciler.clone()).guard();

        if let Err(err) = resync_once(&*store, &reconciler).await {
            tracing::warn!(session = %session_id, error = %err, "initial resync failed");
        }

        let resync = ResyncScheduler::builder()
            .store(store.clone())
            .reconciler(reconciler.clone())
            .interval(bus.config().resync_interval)
            .run_immediately(false)
            .build()
            .start();

        tracing::info!(session = %session_id, "viewer session opened");
        Self {
            session_id,
            reconciler,
            store,
            subscription,
            resync,
            closed: AtomicBool::new(false),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn reconciler(&self) -> &Arc<Reconciler> {
        &self.reconciler
    }

    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    pub fn visible_posts(&self) -> Vec<CommunityPost> {
        self.reconciler.visible_posts()
    }

    pub fn visible_resources(&self) -> Vec<Resource> {
        self.reconciler.visible_resources()
    }

    pub fn visible_partners(&self) -> Vec<Partner> {
        self.reconciler.visible_partners()
    }

    pub fn visible_ngos(&self) -> Vec<Ngo> {
        self.reconciler.visible_ngos()
    }

    pub fn last_updated_at(&self) -> Option<DateTime<Utc>> {
        self.reconciler.last_updated_at()
    }

    pub fn like_post(&self, id: &EntityId) -> Option<u32> {
        self.reconciler.like_post(id)
    }

    pub fn record_resource_view(&self, id: &EntityId) -> Option<u32> {
        self.reconciler.record_resource_view(id)
    }

    /// 按需立即全量同步，返回可见实体数
    pub async fn resync_now(&self) -> SyncResult<usize> {
        resync_once(&*self.store, &self.reconciler).await
    }

    /// 关闭会话；可重复调用
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.subscription.unsubscribe();
        self.resync.shutdown();
        tracing::info!(session = %self.session_id, "viewer session closed");
    }
}

impl Drop for ViewerSession {
    fn drop(&mut self) {
        self.close();
    }
}
