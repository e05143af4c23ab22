//! 同步事件总线（SyncBus）
//!
//! - `emit`：盖戳并追加到内部 FIFO 队列，调用方从不等待投递；
//!   配置了队列容量时，满队列以 `SyncError::Busy` 拒绝（背压而非阻塞）。
//! - `close`：关闭后 `emit` 以 `SyncError::Closed` 拒绝，已入队的事件仍可排空。
//! - `flush`：一次派发过程，排空队列直至为空；对每个事件按注册顺序
//!   同步调用匹配的回调。回调返回错误或 panic 均被捕获并记录，
//!   不影响其他订阅者与后续事件。任一时刻至多一个派发过程。
//! - 诊断：最近派发事件的环形缓冲、订阅者数量、待派发数量与计数器。
//!
use super::handler::{SyncHandler, TypeFilter};
use super::registry::{Registration, SubscriberRegistry, Subscription};
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::event::{NewSyncEvent, SyncEvent};
use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

/// 总线计数器快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    /// 成功入队的事件数
    pub emitted: u64,
    /// 因队列已满或总线已关闭被拒绝的事件数
    pub rejected: u64,
    /// 已派发（出队）的事件数
    pub dispatched: u64,
    /// 成功的回调调用次数
    pub delivered: u64,
    /// 失败（返回错误或 panic）的回调调用次数
    pub callback_failures: u64,
}

#[derive(Default)]
struct Counters {
    emitted: AtomicU64,
    rejected: AtomicU64,
    dispatched: AtomicU64,
    delivered: AtomicU64,
    callback_failures: AtomicU64,
}

pub struct SyncBus {
    config: SyncConfig,
    queue: Mutex<VecDeque<SyncEvent>>,
    registry: Arc<SubscriberRegistry>,
    history: Mutex<VecDeque<SyncEvent>>,
    sequence: AtomicU64,
    drain_lock: Mutex<()>,
    closed: AtomicBool,
    counters: Counters,
}

impl Default for SyncBus {
    fn default() -> Self {
        Self::new(SyncConfig::default())
    }
}

impl SyncBus {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            registry: Arc::new(SubscriberRegistry::default()),
            history: Mutex::new(VecDeque::new()),
            sequence: AtomicU64::new(0),
            drain_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
            counters: Counters::default(),
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// 发布事件：盖戳并入队，返回分配的序号
    pub fn emit(&self, event: NewSyncEvent) -> SyncResult<u64> {
        let mut queue = lock(&self.queue);

        // 与 close 共用队列锁：关闭之后不会再有事件进入队列
        if self.closed.load(Ordering::Acquire) {
            self.counters.rejected.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                entity_type = %event.entity_type(),
                action = %event.action(),
                id = %event.payload().id(),
                "sync bus closed, rejecting event"
            );
            return Err(SyncError::Closed);
        }

        if let Some(capacity) = self.config.queue_capacity
            && queue.len() >= capacity
        {
            self.counters.rejected.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                capacity,
                entity_type = %event.entity_type(),
                action = %event.action(),
                id = %event.payload().id(),
                "sync bus queue full, rejecting event"
            );
            return Err(SyncError::Busy { capacity });
        }

        // 在队列锁内分配序号，保证序号顺序与入队顺序一致
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let event = event.stamp(sequence);
        tracing::debug!(
            event = %event.summary(),
            origin = event.origin_id().unwrap_or("-"),
            "sync event queued"
        );
        queue.push_back(event);
        self.counters.emitted.fetch_add(1, Ordering::Relaxed);

        Ok(sequence)
    }

    /// 关闭总线：此后的 `emit` 一律失败；可重复调用
    pub fn close(&self) {
        let _queue = lock(&self.queue);
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!("sync bus closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// 以回调形式订阅；同一 `subscriber_id` 再次订阅会替换原注册
    pub fn subscribe<F>(
        &self,
        subscriber_id: impl Into<String>,
        filter: impl Into<TypeFilter>,
        callback: F,
    ) -> Subscription
    where
        F: Fn(&SyncEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let subscriber_id = subscriber_id.into();
        let filter = filter.into();
        tracing::debug!(subscriber = %subscriber_id, ?filter, "subscriber registered");
        let registration = self
            .registry
            .register(subscriber_id, filter, Arc::new(callback));
        Subscription::new(&self.registry, registration)
    }

    /// 以处理器形式订阅，订阅者 ID 取 `handler_name`
    pub fn subscribe_handler<H>(&self, handler: Arc<H>) -> Subscription
    where
        H: SyncHandler + ?Sized + 'static,
    {
        let name = handler.handler_name().to_string();
        let filter = handler.handled_types();
        self.subscribe(name, filter, move |event| handler.handle(event))
    }

    /// 执行一次派发过程：排空队列（包括派发期间新入队的事件）
    ///
    /// 若已有派发过程在进行（例如在回调内调用），立即返回 0。
    pub fn flush(&self) -> usize {
        let _drain = match self.drain_lock.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return 0,
        };
        self.drain_queue()
    }

    /// 等待正在进行的派发过程结束后再排空；不可在回调内调用
    pub(crate) fn drain(&self) -> usize {
        let _drain = lock(&self.drain_lock);
        self.drain_queue()
    }

    // 调用方须持有 drain_lock
    fn drain_queue(&self) -> usize {
        let mut dispatched = 0;
        loop {
            let batch = std::mem::take(&mut *lock(&self.queue));
            if batch.is_empty() {
                break;
            }
            for event in batch {
                self.dispatch_one(&event);
                self.remember(event);
                dispatched += 1;
            }
        }

        if dispatched > 0 {
            self.counters
                .dispatched
                .fetch_add(dispatched as u64, Ordering::Relaxed);
            tracing::trace!(dispatched, "sync bus drained");
        }
        dispatched
    }

    fn dispatch_one(&self, event: &SyncEvent) {
        for registration in self.registry.snapshot() {
            if !registration.filter().matches(event.entity_type()) {
                continue;
            }
            // 同一轮派发中可能已被注销：调用前再次检查存活
            if !registration.is_active() {
                continue;
            }
            self.invoke(&registration, event);
        }
    }

    fn invoke(&self, registration: &Registration, event: &SyncEvent) {
        match panic::catch_unwind(AssertUnwindSafe(|| registration.invoke(event))) {
            Ok(Ok(())) => {
                self.counters.delivered.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(err)) => {
                self.counters
                    .callback_failures
                    .fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    subscriber = registration.subscriber_id(),
                    event = %event.summary(),
                    error = %err,
                    "subscriber callback failed"
                );
            }
            Err(payload) => {
                self.counters
                    .callback_failures
                    .fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    subscriber = registration.subscriber_id(),
                    event = %event.summary(),
                    panic = panic_message(payload.as_ref()),
                    "subscriber callback panicked"
                );
            }
        }
    }

    fn remember(&self, event: SyncEvent) {
        let capacity = self.config.history_capacity;
        if capacity == 0 {
            return;
        }
        let mut history = lock(&self.history);
        while history.len() >= capacity {
            history.pop_front();
        }
        history.push_back(event);
    }

    /// 最近派发的事件（旧到新），仅供诊断，不用于重放
    pub fn recent_events(&self) -> Vec<SyncEvent> {
        lock(&self.history).iter().cloned().collect()
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.queue).len()
    }

    pub fn stats(&self) -> BusStats {
        BusStats {
            emitted: self.counters.emitted.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
            dispatched: self.counters.dispatched.load(Ordering::Relaxed),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            callback_failures: self.counters.callback_failures.load(Ordering::Relaxed),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::SyncAction;
    use crate::model::{EntityType, Ngo, Partner, Resource};
    use std::sync::Weak;

    type Log = Arc<Mutex<Vec<String>>>;

    fn resource_event(id: &str, published: bool) -> NewSyncEvent {
        NewSyncEvent::for_entity(
            SyncAction::Create,
            Resource {
                id: id.into(),
                is_published: published,
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn recorder(log: &Log) -> impl Fn(&SyncEvent) -> anyhow::Result<()> + Send + Sync + 'static {
        let log = log.clone();
        move |event| {
            log.lock().unwrap().push(event.entity_id().to_string());
            Ok(())
        }
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[test]
    fn emit_is_queued_until_flush() {
        let bus = SyncBus::default();
        let log = Log::default();
        let _sub = bus.subscribe("a", TypeFilter::All, recorder(&log));

        assert_eq!(bus.emit(resource_event("r1", true)).unwrap(), 1);
        assert_eq!(bus.emit(resource_event("r2", true)).unwrap(), 2);
        assert_eq!(bus.pending_count(), 2);
        assert!(entries(&log).is_empty());

        assert_eq!(bus.flush(), 2);
        assert_eq!(bus.pending_count(), 0);
        assert_eq!(entries(&log), vec!["r1", "r2"]);
    }

    #[test]
    fn delivery_follows_emission_order() {
        let bus = SyncBus::default();
        let log = Log::default();
        let _sub = bus.subscribe("a", TypeFilter::All, recorder(&log));

        let expected: Vec<String> = (0..20).map(|i| format!("r{i}")).collect();
        for id in &expected {
            bus.emit(resource_event(id, true)).unwrap();
        }
        bus.flush();

        assert_eq!(entries(&log), expected);
        let sequences: Vec<u64> = bus.recent_events().iter().map(|e| e.sequence()).collect();
        assert!(sequences.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn type_filter_limits_callbacks() {
        let bus = SyncBus::default();
        let a = Log::default();
        let b = Log::default();
        let _a = bus.subscribe("a", EntityType::Partner, recorder(&a));
        let _b = bus.subscribe("b", TypeFilter::All, recorder(&b));

        bus.emit(
            NewSyncEvent::for_entity(
                SyncAction::Create,
                Partner {
                    id: "p1".into(),
                    is_active: true,
                    ..Default::default()
                },
            )
            .unwrap(),
        )
        .unwrap();
        bus.emit(
            NewSyncEvent::for_entity(
                SyncAction::Create,
                Ngo {
                    id: "n1".into(),
                    is_active: true,
                    ..Default::default()
                },
            )
            .unwrap(),
        )
        .unwrap();
        bus.flush();

        assert_eq!(entries(&a), vec!["p1"]);
        assert_eq!(entries(&b), vec!["p1", "n1"]);
    }

    #[test]
    fn failing_and_panicking_callbacks_are_isolated() {
        let bus = SyncBus::default();
        let b = Log::default();
        let attempts = Log::default();

        let attempts_in_cb = attempts.clone();
        let _a = bus.subscribe("a", TypeFilter::All, move |event| {
            attempts_in_cb
                .lock()
                .unwrap()
                .push(event.entity_id().to_string());
            match event.entity_id().as_str() {
                "boom" => panic!("view crashed"),
                "bad" => anyhow::bail!("cannot render"),
                _ => Ok(()),
            }
        });
        let _b = bus.subscribe("b", TypeFilter::All, recorder(&b));

        bus.emit(resource_event("bad", true)).unwrap();
        bus.emit(resource_event("boom", true)).unwrap();
        bus.emit(resource_event("ok", true)).unwrap();
        assert_eq!(bus.flush(), 3);

        assert_eq!(entries(&attempts), vec!["bad", "boom", "ok"]);
        assert_eq!(entries(&b), vec!["bad", "boom", "ok"]);

        let stats = bus.stats();
        assert_eq!(stats.callback_failures, 2);
        assert_eq!(stats.delivered, 4);
        assert_eq!(stats.dispatched, 3);
    }

    #[test]
    fn bounded_queue_rejects_with_busy() {
        let bus = SyncBus::new(SyncConfig::builder().queue_capacity(2).build());

        bus.emit(resource_event("r1", true)).unwrap();
        bus.emit(resource_event("r2", true)).unwrap();
        let err = bus.emit(resource_event("r3", true)).unwrap_err();
        assert!(matches!(err, SyncError::Busy { capacity: 2 }));
        assert_eq!(bus.stats().rejected, 1);

        bus.flush();
        assert!(bus.emit(resource_event("r3", true)).is_ok());
    }

    #[test]
    fn history_keeps_only_the_latest_events() {
        let bus = SyncBus::new(SyncConfig::builder().history_capacity(3).build());
        for i in 1..=5 {
            bus.emit(resource_event(&format!("r{i}"), true)).unwrap();
        }
        bus.flush();

        let recent: Vec<u64> = bus.recent_events().iter().map(|e| e.sequence()).collect();
        assert_eq!(recent, vec![3, 4, 5]);
    }

    #[test]
    fn oversized_history_capacity_is_allocated_lazily() {
        let bus = SyncBus::new(SyncConfig::builder().history_capacity(usize::MAX).build());
        bus.emit(resource_event("r1", true)).unwrap();
        bus.flush();
        assert_eq!(bus.recent_events().len(), 1);
    }

    #[test]
    fn closed_bus_rejects_emit_but_drains_accepted_events() {
        let bus = SyncBus::default();
        let log = Log::default();
        let _sub = bus.subscribe("log", TypeFilter::All, recorder(&log));

        bus.emit(resource_event("r1", true)).unwrap();
        bus.close();
        bus.close();
        assert!(bus.is_closed());

        let err = bus.emit(resource_event("r2", true)).unwrap_err();
        assert!(matches!(err, SyncError::Closed));
        assert_eq!(bus.stats().rejected, 1);
        assert_eq!(bus.pending_count(), 1);

        assert_eq!(bus.drain(), 1);
        assert_eq!(entries(&log), vec!["r1"]);
    }

    #[test]
    fn unsubscribe_inside_callback_stops_delivery_in_the_same_pass() {
        let bus = SyncBus::default();
        let a = Log::default();
        let b = Log::default();
        let b_slot: Arc<Mutex<Option<Subscription>>> = Arc::default();
        let a_slot: Arc<Mutex<Option<Subscription>>> = Arc::default();

        let a_log = a.clone();
        let (a_self, b_handle) = (a_slot.clone(), b_slot.clone());
        let sub_a = bus.subscribe("a", TypeFilter::All, move |event| {
            a_log.lock().unwrap().push(event.entity_id().to_string());
            // 注销自己与排在后面的 b
            if let Some(sub) = a_self.lock().unwrap().as_ref() {
                sub.unsubscribe();
            }
            if let Some(sub) = b_handle.lock().unwrap().as_ref() {
                sub.unsubscribe();
            }
            Ok(())
        });
        let sub_b = bus.subscribe("b", TypeFilter::All, recorder(&b));
        *a_slot.lock().unwrap() = Some(sub_a);
        *b_slot.lock().unwrap() = Some(sub_b);

        bus.emit(resource_event("r1", true)).unwrap();
        bus.emit(resource_event("r2", true)).unwrap();
        bus.flush();

        assert_eq!(entries(&a), vec!["r1"]);
        assert!(entries(&b).is_empty());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn replaced_registration_stops_the_old_callback() {
        let bus = SyncBus::default();
        let old = Log::default();
        let new = Log::default();

        let old_sub = bus.subscribe("viewer", TypeFilter::All, recorder(&old));
        let _new_sub = bus.subscribe("viewer", TypeFilter::All, recorder(&new));
        assert_eq!(bus.subscriber_count(), 1);
        assert!(!old_sub.is_active());

        bus.emit(resource_event("r1", true)).unwrap();
        bus.flush();

        assert!(entries(&old).is_empty());
        assert_eq!(entries(&new), vec!["r1"]);

        // 旧句柄注销不影响替换后的注册
        assert!(!old_sub.unsubscribe());
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn events_emitted_during_dispatch_are_drained_in_the_same_flush() {
        let bus = Arc::new(SyncBus::default());
        let log = Log::default();
        let weak: Weak<SyncBus> = Arc::downgrade(&bus);

        let _relay = bus.subscribe("relay", EntityType::Resource, move |event| {
            if event.entity_id().as_str() == "r1"
                && let Some(bus) = weak.upgrade()
            {
                // 回调内嵌套 flush 不会启动第二个派发过程
                assert_eq!(bus.flush(), 0);
                bus.emit(resource_event("r2", true))?;
            }
            Ok(())
        });
        let _rec = bus.subscribe("rec", TypeFilter::All, recorder(&log));

        bus.emit(resource_event("r1", true)).unwrap();
        assert_eq!(bus.flush(), 2);
        assert_eq!(entries(&log), vec!["r1", "r2"]);
    }
}
