use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use sync_application::{AdminContext, ContentAdmin, ViewerSession};
use sync_domain::SyncConfig;
use sync_domain::eventing::SyncBus;
use sync_domain::model::{
    CommunityPost, Ngo, Partner, PortalSettings, Resource, UserAccount, UserRole,
};
use sync_domain::persist::{InMemoryStore, PersistenceStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn seed() -> InMemoryStore {
    InMemoryStore::seeded([
        Partner {
            id: "partner-1".into(),
            name: "Mind Matters".into(),
            website: "https://mindmatters.example".into(),
            is_active: true,
            ..Default::default()
        }
        .into(),
        Ngo {
            id: "ngo-1".into(),
            name: "Helping Hands".into(),
            region: "North".into(),
            is_active: false,
            ..Default::default()
        }
        .into(),
        UserAccount {
            id: "user-1".into(),
            display_name: "Riley".into(),
            is_active: true,
            ..Default::default()
        }
        .into(),
    ])
}

fn print_view(label: &str, session: &ViewerSession) {
    println!(
        "[{label}] posts={:?} resources={:?} partners={:?} ngos={:?} updated={:?}",
        session
            .visible_posts()
            .iter()
            .map(|p| p.title.clone())
            .collect::<Vec<_>>(),
        session
            .visible_resources()
            .iter()
            .map(|r| format!("{} ({} views)", r.title, r.views))
            .collect::<Vec<_>>(),
        session
            .visible_partners()
            .iter()
            .map(|p| p.name.clone())
            .collect::<Vec<_>>(),
        session
            .visible_ngos()
            .iter()
            .map(|n| n.name.clone())
            .collect::<Vec<_>>(),
        session.last_updated_at(),
    );
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sync_domain=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = SyncConfig::from_env()?;
    tracing::info!(?config, "starting portal sync demo");

    let store = seed();
    let shared: Arc<dyn PersistenceStore> = Arc::new(store.clone());
    let bus = Arc::new(SyncBus::new(config.clone()));
    let dispatcher = bus.spawn_dispatcher();

    let admin = ContentAdmin::new(shared.clone(), bus.clone());
    let ctx = AdminContext::new("admin-1").with_request_id("demo");

    // 两个访客会话：打开时即完成首次全量同步
    let alice = ViewerSession::open("alice", &bus, shared.clone()).await;
    let bob = ViewerSession::open("bob", &bus, shared.clone()).await;
    print_view("alice/open", &alice);

    // 管理员变更：写入成功后才发出事件
    admin
        .create(
            &ctx,
            CommunityPost {
                id: "post-1".into(),
                title: "Coping with exam stress".into(),
                author: "Sam".into(),
                category: "students".into(),
                tags: vec!["stress".into(), "study".into()],
                is_published: true,
                created_at: Utc::now(),
                ..Default::default()
            },
        )
        .await?;
    admin
        .create(
            &ctx,
            Resource {
                id: "res-1".into(),
                title: "Breathing exercises".into(),
                url: "https://example.org/breathing".into(),
                category: "self-help".into(),
                is_published: false,
                ..Default::default()
            },
        )
        .await?;
    admin.publish::<Resource>(&ctx, &"res-1".into()).await?;
    admin.publish::<Ngo>(&ctx, &"ngo-1".into()).await?;
    admin.unpublish::<Partner>(&ctx, &"partner-1".into()).await?;
    admin
        .change_user_role(&ctx, &"user-1".into(), UserRole::Moderator)
        .await?;
    admin
        .update_settings(
            &ctx,
            PortalSettings {
                id: "global".into(),
                site_name: "Calm Harbor".into(),
                chat_enabled: true,
                ..Default::default()
            },
        )
        .await?;

    // 等待派发循环至少 tick 一次
    tokio::time::sleep(config.dispatch_interval + Duration::from_millis(100)).await;
    print_view("alice/after-mutations", &alice);
    print_view("bob/after-mutations", &bob);

    // 本地乐观计数只对当前会话可见
    alice.like_post(&"post-1".into());
    alice.record_resource_view(&"res-1".into());
    print_view("alice/local", &alice);
    print_view("bob/local", &bob);

    let stats = bus.stats();
    println!(
        "bus: subscribers={}, pending={}, stats={:?}",
        bus.subscriber_count(),
        bus.pending_count(),
        stats
    );
    for event in bus.recent_events() {
        println!("recent: {}", serde_json::to_string(&event)?);
    }

    alice.close();
    bob.close();
    dispatcher.shutdown();
    dispatcher.join().await;
    Ok(())
}
