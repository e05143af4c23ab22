//! 订阅者注册表
//!
//! 注册表按注册顺序保存订阅；同一订阅者 ID 再次注册时原位替换。
//! 派发时只对注册表做快照，回调执行期间不持有锁，因此回调内
//! 订阅/注销都是安全的。每次调用前都会重新检查注册是否仍然存活。
//!
use super::handler::TypeFilter;
use crate::event::SyncEvent;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

pub(crate) type Callback = Arc<dyn Fn(&SyncEvent) -> anyhow::Result<()> + Send + Sync>;

pub(crate) struct Registration {
    subscriber_id: String,
    generation: u64,
    filter: TypeFilter,
    callback: Callback,
    active: AtomicBool,
}

impl Registration {
    pub(crate) fn subscriber_id(&self) -> &str {
        &self.subscriber_id
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn filter(&self) -> &TypeFilter {
        &self.filter
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn invoke(&self, event: &SyncEvent) -> anyhow::Result<()> {
        (self.callback)(event)
    }

    /// 失效并返回此前是否处于存活状态
    fn deactivate(&self) -> bool {
        self.active.swap(false, Ordering::AcqRel)
    }
}

#[derive(Default)]
pub(crate) struct SubscriberRegistry {
    entries: RwLock<Vec<Arc<Registration>>>,
    next_generation: AtomicU64,
}

impl SubscriberRegistry {
    pub(crate) fn register(
        &self,
        subscriber_id: String,
        filter: TypeFilter,
        callback: Callback,
    ) -> Arc<Registration> {
        let registration = Arc::new(Registration {
            subscriber_id,
            generation: self.next_generation.fetch_add(1, Ordering::Relaxed),
            filter,
            callback,
            active: AtomicBool::new(true),
        });

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries
            .iter_mut()
            .find(|r| r.subscriber_id == registration.subscriber_id)
        {
            Some(slot) => {
                slot.deactivate();
                *slot = registration.clone();
            }
            None => entries.push(registration.clone()),
        }

        registration
    }

    /// 移除指定注册（按实例比较，已被替换的旧注册不会误删新注册）
    pub(crate) fn remove(&self, registration: &Arc<Registration>) -> bool {
        let was_active = registration.deactivate();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|r| !Arc::ptr_eq(r, registration));
        was_active
    }

    pub(crate) fn snapshot(&self) -> Vec<Arc<Registration>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// 订阅句柄
///
/// `unsubscribe` 可重复调用（第二次起为空操作），也可在回调内部调用。
/// 默认情况下丢弃句柄不会注销；通过 `guard()` 转为随作用域自动注销。
pub struct Subscription {
    registry: Weak<SubscriberRegistry>,
    registration: Arc<Registration>,
    unsubscribe_on_drop: bool,
}

impl Subscription {
    pub(crate) fn new(registry: &Arc<SubscriberRegistry>, registration: Arc<Registration>) -> Self {
        Self {
            registry: Arc::downgrade(registry),
            registration,
            unsubscribe_on_drop: false,
        }
    }

    pub fn subscriber_id(&self) -> &str {
        self.registration.subscriber_id()
    }

    /// 注册是否仍然存活（未注销、未被同 ID 的新注册替换）
    pub fn is_active(&self) -> bool {
        self.registration.is_active()
    }

    /// 注销；返回本次调用是否真正移除了注册
    pub fn unsubscribe(&self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.remove(&self.registration),
            None => self.registration.deactivate(),
        }
    }

    /// 转为作用域守卫：句柄被丢弃时自动注销
    pub fn guard(mut self) -> Self {
        self.unsubscribe_on_drop = true;
        self
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("subscriber_id", &self.registration.subscriber_id())
            .field("generation", &self.registration.generation())
            .field("active", &self.is_active())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.unsubscribe_on_drop {
            self.unsubscribe();
        }
    }
}
