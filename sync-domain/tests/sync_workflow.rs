use anyhow::Result as AnyResult;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sync_domain::SyncConfig;
use sync_domain::event::{NewSyncEvent, SyncAction, SyncEvent};
use sync_domain::eventing::{SyncBus, SyncHandler, TypeFilter};
use sync_domain::model::{EntityType, Ngo, Partner, Resource};
use sync_domain::persist::{InMemoryStore, PersistenceStore};
use sync_domain::reconcile::{Reconciler, ResyncScheduler, VisibleState, resync_once};

/// 对某个资源 ID 总是失败的处理器
struct Flaky {
    bad_id: &'static str,
    seen: Mutex<Vec<String>>,
}

impl SyncHandler for Flaky {
    fn handler_name(&self) -> &str {
        "flaky"
    }

    fn handled_types(&self) -> TypeFilter {
        TypeFilter::All
    }

    fn handle(&self, event: &SyncEvent) -> AnyResult<()> {
        self.seen
            .lock()
            .unwrap()
            .push(event.entity_id().to_string());
        if event.entity_id().as_str() == self.bad_id {
            anyhow::bail!("cannot render {}", self.bad_id);
        }
        Ok(())
    }
}

fn resource(id: &str, published: bool) -> Resource {
    Resource {
        id: id.into(),
        title: format!("resource {id}"),
        is_published: published,
        ..Default::default()
    }
}

fn partner(id: &str, active: bool) -> Partner {
    Partner {
        id: id.into(),
        name: format!("partner {id}"),
        is_active: active,
        ..Default::default()
    }
}

async fn wait_until<F: FnMut() -> bool>(mut done: F) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !done() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test(flavor = "multi_thread")]
async fn dispatcher_feeds_reconcilers_with_fault_isolation() -> AnyResult<()> {
    let bus = Arc::new(SyncBus::new(
        SyncConfig::builder()
            .dispatch_interval(Duration::from_millis(10))
            .build(),
    ));
    let flaky = Arc::new(Flaky {
        bad_id: "r1",
        seen: Mutex::new(Vec::new()),
    });
    let viewer = Arc::new(Reconciler::new("viewer"));

    // flaky 先注册，它的失败不能影响后面的 viewer
    let _flaky = bus.subscribe_handler(flaky.clone());
    let _viewer = bus.subscribe_handler(viewer.clone());
    let handle = bus.spawn_dispatcher();

    bus.emit(NewSyncEvent::for_entity(SyncAction::Create, resource("r1", true))?)?;
    bus.emit(NewSyncEvent::for_entity(SyncAction::Create, resource("r2", true))?)?;
    bus.emit(NewSyncEvent::for_entity(SyncAction::Update, resource("r2", false))?)?;

    wait_until(|| bus.stats().dispatched == 3).await;

    let ids: Vec<String> = viewer
        .visible_resources()
        .into_iter()
        .map(|r| r.id.to_string())
        .collect();
    assert_eq!(ids, vec!["r1"]);
    assert_eq!(*flaky.seen.lock().unwrap(), vec!["r1", "r2", "r2"]);
    assert_eq!(bus.stats().callback_failures, 1);

    handle.shutdown();
    handle.join().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn partner_filter_sees_one_callback_unfiltered_sees_two() -> AnyResult<()> {
    let bus = SyncBus::default();
    let a = Arc::new(AtomicUsize::new(0));
    let b = Arc::new(AtomicUsize::new(0));

    let a_count = a.clone();
    let _a = bus.subscribe("A", EntityType::Partner, move |_| {
        a_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let b_count = b.clone();
    let _b = bus.subscribe("B", TypeFilter::All, move |_| {
        b_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    bus.emit(NewSyncEvent::for_entity(SyncAction::Create, partner("p1", true))?)?;
    bus.emit(NewSyncEvent::for_entity(
        SyncAction::Create,
        Ngo {
            id: "n1".into(),
            is_active: true,
            ..Default::default()
        },
    )?)?;
    bus.flush();

    assert_eq!(a.load(Ordering::SeqCst), 1);
    assert_eq!(b.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn resync_converges_regardless_of_delivery_history() -> AnyResult<()> {
    let store = InMemoryStore::new();
    let bus = SyncBus::default();
    let viewer = Arc::new(Reconciler::new("viewer"));
    let _sub = bus.subscribe_handler(viewer.clone());

    // 存储的最终状态
    store.save(resource("r1", true).into()).await?;
    store.save(resource("r2", false).into()).await?;
    store.save(partner("p1", true).into()).await?;

    // 乱序、重复、遗漏的事件历史
    let update_hidden = NewSyncEvent::for_entity(SyncAction::Update, resource("r1", false))?;
    bus.emit(update_hidden.clone())?;
    bus.emit(update_hidden)?;
    bus.emit(NewSyncEvent::for_entity(SyncAction::Create, resource("r2", true))?)?;
    bus.flush();

    let mut all = Vec::new();
    for t in EntityType::CONTENT {
        all.extend(store.load_all(t).await?);
    }
    let expected = VisibleState::from_snapshots(all);
    assert_ne!(viewer.snapshot(), expected);

    let handle = ResyncScheduler::builder()
        .store(Arc::new(store.clone()))
        .reconciler(viewer.clone())
        .interval(Duration::from_millis(20))
        .build()
        .start();
    wait_until(|| viewer.snapshot() == expected).await;

    handle.shutdown();
    handle.join().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_store_keeps_the_last_good_state() -> AnyResult<()> {
    let store = InMemoryStore::seeded([resource("r1", true).into(), partner("p1", true).into()]);
    let viewer = Arc::new(Reconciler::new("viewer"));
    resync_once(&store, &viewer).await?;
    let good = viewer.snapshot();

    store.set_offline(true);
    assert!(resync_once(&store, &viewer).await.is_err());

    // 周期任务在故障期间多次失败，状态保持不变
    let handle = ResyncScheduler::builder()
        .store(Arc::new(store.clone()))
        .reconciler(viewer.clone())
        .interval(Duration::from_millis(10))
        .build()
        .start();
    tokio::time::sleep(Duration::from_millis(40)).await;

    assert_eq!(viewer.snapshot(), good);
    handle.shutdown();
    handle.join().await;
    Ok(())
}
