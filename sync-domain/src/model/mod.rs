//! 实体模型（model）
//!
//! - `EntityType`：封闭的实体类别集合，新增类别只能通过新增变体；
//! - `EntityId`：生产者分配、在同类别内唯一的稳定标识；
//! - `SyncEntity`：所有可同步实体的最小接口（标识 + 可见性）；
//! - `EntitySnapshot`：按类别区分的强类型快照（事件载荷与持久化形态）。
//!
mod account;
mod content;

pub use account::{PortalSettings, UserAccount, UserRole};
pub use content::{CommunityPost, Ngo, Partner, Resource};

use crate::error::SyncError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use sync_macros::entity_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    CommunityPost,
    Resource,
    Partner,
    Ngo,
    User,
    Settings,
}

impl EntityType {
    pub const ALL: [EntityType; 6] = [
        EntityType::CommunityPost,
        EntityType::Resource,
        EntityType::Partner,
        EntityType::Ngo,
        EntityType::User,
        EntityType::Settings,
    ];

    /// 访客视图中维护可见映射的内容类别
    pub const CONTENT: [EntityType; 4] = [
        EntityType::CommunityPost,
        EntityType::Resource,
        EntityType::Partner,
        EntityType::Ngo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::CommunityPost => "community_post",
            EntityType::Resource => "resource",
            EntityType::Partner => "partner",
            EntityType::Ngo => "ngo",
            EntityType::User => "user",
            EntityType::Settings => "settings",
        }
    }

    pub fn is_content(&self) -> bool {
        Self::CONTENT.contains(self)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| SyncError::Parse {
                reason: format!("unknown entity type: {s}"),
            })
    }
}

/// 实体标识
#[entity_id]
pub struct EntityId(String);

/// 可同步实体：具备稳定标识与唯一的可见性开关
///
/// 可见性是访客视图能否包含该实体的唯一依据：
/// 帖子/资源对应 `is_published`，合作伙伴/NGO/用户对应 `is_active`。
/// 通常由 `#[sync_entity]` 宏生成实现。
pub trait SyncEntity: Clone + PartialEq + Send + Sync + 'static + Into<EntitySnapshot> {
    const ENTITY_TYPE: EntityType;

    fn id(&self) -> &EntityId;

    fn is_visible(&self) -> bool;

    fn set_visible(&mut self, visible: bool);

    /// 从通用快照还原具体类型；类别不符时返回 `None`
    fn from_snapshot(snapshot: EntitySnapshot) -> Option<Self>;
}

/// 强类型实体快照：每个类别一个变体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EntitySnapshot {
    CommunityPost(CommunityPost),
    Resource(Resource),
    Partner(Partner),
    Ngo(Ngo),
    User(UserAccount),
    Settings(PortalSettings),
}

impl EntitySnapshot {
    pub fn entity_type(&self) -> EntityType {
        match self {
            EntitySnapshot::CommunityPost(_) => EntityType::CommunityPost,
            EntitySnapshot::Resource(_) => EntityType::Resource,
            EntitySnapshot::Partner(_) => EntityType::Partner,
            EntitySnapshot::Ngo(_) => EntityType::Ngo,
            EntitySnapshot::User(_) => EntityType::User,
            EntitySnapshot::Settings(_) => EntityType::Settings,
        }
    }

    pub fn id(&self) -> &EntityId {
        match self {
            EntitySnapshot::CommunityPost(e) => e.id(),
            EntitySnapshot::Resource(e) => e.id(),
            EntitySnapshot::Partner(e) => e.id(),
            EntitySnapshot::Ngo(e) => e.id(),
            EntitySnapshot::User(e) => e.id(),
            EntitySnapshot::Settings(e) => e.id(),
        }
    }

    pub fn is_visible(&self) -> bool {
        match self {
            EntitySnapshot::CommunityPost(e) => e.is_visible(),
            EntitySnapshot::Resource(e) => e.is_visible(),
            EntitySnapshot::Partner(e) => e.is_visible(),
            EntitySnapshot::Ngo(e) => e.is_visible(),
            EntitySnapshot::User(e) => e.is_visible(),
            EntitySnapshot::Settings(e) => e.is_visible(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_type_names_round_trip() {
        for t in EntityType::ALL {
            assert_eq!(t.as_str().parse::<EntityType>().unwrap(), t);
            assert_eq!(serde_json::to_value(t).unwrap(), t.as_str());
        }
        assert!("comment".parse::<EntityType>().is_err());
    }

    #[test]
    fn only_four_categories_are_content() {
        assert!(EntityType::Ngo.is_content());
        assert!(!EntityType::User.is_content());
        assert!(!EntityType::Settings.is_content());
    }

    #[test]
    fn snapshot_reports_type_id_and_visibility() {
        let partner = Partner {
            id: "p1".into(),
            name: "Mind Matters".into(),
            is_active: true,
            ..Default::default()
        };
        let snapshot = EntitySnapshot::from(partner.clone());

        assert_eq!(snapshot.entity_type(), EntityType::Partner);
        assert_eq!(snapshot.id().as_str(), "p1");
        assert!(snapshot.is_visible());
        assert_eq!(Partner::from_snapshot(snapshot.clone()), Some(partner));
        assert_eq!(Ngo::from_snapshot(snapshot), None);
    }

    #[test]
    fn set_visible_toggles_the_declared_flag() {
        let mut resource = Resource {
            id: "r1".into(),
            ..Default::default()
        };
        assert!(!resource.is_visible());
        resource.set_visible(true);
        assert!(resource.is_published);

        let mut settings = PortalSettings::default();
        settings.set_visible(false);
        assert!(settings.is_visible());
    }

    #[test]
    fn snapshot_json_is_tagged_by_type() {
        let snapshot = EntitySnapshot::from(Ngo {
            id: "n1".into(),
            name: "Helping Hands".into(),
            ..Default::default()
        });
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["type"], "ngo");
        assert_eq!(json["data"]["id"], "n1");
        assert_eq!(json["data"]["isActive"], false);

        let back: EntitySnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, snapshot);
    }
}
