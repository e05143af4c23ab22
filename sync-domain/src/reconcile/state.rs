//! 可见实体状态与幂等应用算法
//!
//! 每个内容类别一张 `id -> 实体` 映射，只保存可见实体：
//! - 创建/发布：可见则写入，不可见则忽略；
//! - 更新：可见则写入，不可见则移除；
//! - 删除/下架：存在则移除，不存在则忽略。
//!
//! 同一事件重复应用，第二次起结果为 `Unchanged`。
//!
use crate::event::{SyncAction, SyncEvent};
use crate::model::{CommunityPost, EntityId, EntitySnapshot, EntityType, Ngo, Partner, Resource};
use std::collections::BTreeMap;

/// 单次应用的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Inserted,
    Replaced,
    Removed,
    Unchanged,
    /// 非内容类别的事件，不维护可见映射
    Ignored,
}

impl ApplyOutcome {
    pub fn changed(&self) -> bool {
        matches!(
            self,
            ApplyOutcome::Inserted | ApplyOutcome::Replaced | ApplyOutcome::Removed
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibleState {
    posts: BTreeMap<EntityId, CommunityPost>,
    resources: BTreeMap<EntityId, Resource>,
    partners: BTreeMap<EntityId, Partner>,
    ngos: BTreeMap<EntityId, Ngo>,
}

impl VisibleState {
    /// 由全量数据构造：只保留可见的内容实体
    pub fn from_snapshots(snapshots: impl IntoIterator<Item = EntitySnapshot>) -> Self {
        let mut state = Self::default();
        for snapshot in snapshots {
            if snapshot.is_visible() {
                state.upsert(snapshot);
            }
        }
        state
    }

    pub fn apply(&mut self, event: &SyncEvent) -> ApplyOutcome {
        let entity_type = event.entity_type();
        if !entity_type.is_content() {
            return ApplyOutcome::Ignored;
        }

        let snapshot = event.payload().snapshot();
        match event.action() {
            SyncAction::Create | SyncAction::Publish => match snapshot {
                Some(s) if s.is_visible() => self.upsert(s.clone()),
                _ => ApplyOutcome::Unchanged,
            },
            SyncAction::Update => match snapshot {
                Some(s) if s.is_visible() => self.upsert(s.clone()),
                Some(_) => self.remove(entity_type, event.entity_id()),
                None => ApplyOutcome::Unchanged,
            },
            SyncAction::Delete | SyncAction::Unpublish => {
                self.remove(entity_type, event.entity_id())
            }
        }
    }

    fn upsert(&mut self, snapshot: EntitySnapshot) -> ApplyOutcome {
        match snapshot {
            EntitySnapshot::CommunityPost(e) => upsert_into(&mut self.posts, e.id.clone(), e),
            EntitySnapshot::Resource(e) => upsert_into(&mut self.resources, e.id.clone(), e),
            EntitySnapshot::Partner(e) => upsert_into(&mut self.partners, e.id.clone(), e),
            EntitySnapshot::Ngo(e) => upsert_into(&mut self.ngos, e.id.clone(), e),
            EntitySnapshot::User(_) | EntitySnapshot::Settings(_) => ApplyOutcome::Ignored,
        }
    }

    fn remove(&mut self, entity_type: EntityType, id: &EntityId) -> ApplyOutcome {
        let removed = match entity_type {
            EntityType::CommunityPost => self.posts.remove(id).is_some(),
            EntityType::Resource => self.resources.remove(id).is_some(),
            EntityType::Partner => self.partners.remove(id).is_some(),
            EntityType::Ngo => self.ngos.remove(id).is_some(),
            EntityType::User | EntityType::Settings => return ApplyOutcome::Ignored,
        };
        if removed {
            ApplyOutcome::Removed
        } else {
            ApplyOutcome::Unchanged
        }
    }

    pub fn posts(&self) -> &BTreeMap<EntityId, CommunityPost> {
        &self.posts
    }

    pub fn resources(&self) -> &BTreeMap<EntityId, Resource> {
        &self.resources
    }

    pub fn partners(&self) -> &BTreeMap<EntityId, Partner> {
        &self.partners
    }

    pub fn ngos(&self) -> &BTreeMap<EntityId, Ngo> {
        &self.ngos
    }

    pub(crate) fn posts_mut(&mut self) -> &mut BTreeMap<EntityId, CommunityPost> {
        &mut self.posts
    }

    pub(crate) fn resources_mut(&mut self) -> &mut BTreeMap<EntityId, Resource> {
        &mut self.resources
    }

    pub fn contains(&self, entity_type: EntityType, id: &EntityId) -> bool {
        match entity_type {
            EntityType::CommunityPost => self.posts.contains_key(id),
            EntityType::Resource => self.resources.contains_key(id),
            EntityType::Partner => self.partners.contains_key(id),
            EntityType::Ngo => self.ngos.contains_key(id),
            EntityType::User | EntityType::Settings => false,
        }
    }

    pub fn len(&self) -> usize {
        self.posts.len() + self.resources.len() + self.partners.len() + self.ngos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn upsert_into<E: PartialEq>(
    map: &mut BTreeMap<EntityId, E>,
    id: EntityId,
    entity: E,
) -> ApplyOutcome {
    match map.get(&id) {
        Some(existing) if *existing == entity => ApplyOutcome::Unchanged,
        Some(_) => {
            map.insert(id, entity);
            ApplyOutcome::Replaced
        }
        None => {
            map.insert(id, entity);
            ApplyOutcome::Inserted
        }
    }
}
