//! 全量同步（兜底自愈）
//!
//! 从持久化存储加载四个内容类别，按可见性过滤后整体替换对账器状态。
//! 任一类别加载失败则保留原状态不动。
//!
use super::reconciler::Reconciler;
use super::state::VisibleState;
use crate::error::SyncResult;
use crate::model::EntityType;
use crate::persist::PersistenceStore;

/// 执行一次全量同步，返回替换后的可见实体数
pub async fn resync_once<S>(store: &S, reconciler: &Reconciler) -> SyncResult<usize>
where
    S: PersistenceStore + ?Sized,
{
    let mut snapshots = Vec::new();
    for entity_type in EntityType::CONTENT {
        snapshots.extend(store.load_all(entity_type).await?);
    }

    let state = VisibleState::from_snapshots(snapshots);
    let visible = state.len();
    reconciler.replace(state);
    Ok(visible)
}

#[cfg(feature = "eventing")]
pub use scheduler::ResyncScheduler;

#[cfg(feature = "eventing")]
mod scheduler {
    use super::resync_once;
    use crate::eventing::{WorkerHandle, spawn_periodic};
    use crate::persist::PersistenceStore;
    use crate::reconcile::Reconciler;
    use bon::Builder;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    /// 周期全量同步任务
    #[derive(Builder)]
    pub struct ResyncScheduler {
        store: Arc<dyn PersistenceStore>,
        reconciler: Arc<Reconciler>,
        #[builder(default = Duration::from_secs(30))]
        interval: Duration,
        /// 启动时是否立即执行一次
        #[builder(default = true)]
        run_immediately: bool,
    }

    impl ResyncScheduler {
        pub fn start(self) -> WorkerHandle {
            let token = CancellationToken::new();
            let Self {
                store,
                reconciler,
                interval,
                run_immediately,
            } = self;

            let task = spawn_periodic(token.clone(), interval, run_immediately, move || {
                let store = store.clone();
                let reconciler = reconciler.clone();
                async move {
                    match resync_once(&*store, &reconciler).await {
                        Ok(visible) => tracing::debug!(
                            reconciler = reconciler.name(),
                            visible,
                            "resync completed"
                        ),
                        Err(err) => tracing::warn!(
                            reconciler = reconciler.name(),
                            error = %err,
                            "resync failed, keeping previous state"
                        ),
                    }
                }
            });

            WorkerHandle::new(token, vec![task])
        }
    }
}
