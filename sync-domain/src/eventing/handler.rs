//! 事件处理器（SyncHandler）与类型过滤
//!
use crate::event::SyncEvent;
use crate::model::EntityType;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TypeFilter {
    #[default]
    All,
    One(EntityType),
    Many(Vec<EntityType>),
}

impl TypeFilter {
    /// 仅内容类别（帖子、资源、合作伙伴、NGO）
    pub fn content() -> Self {
        TypeFilter::Many(EntityType::CONTENT.to_vec())
    }

    pub fn matches(&self, entity_type: EntityType) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::One(t) => *t == entity_type,
            TypeFilter::Many(ts) => ts.contains(&entity_type),
        }
    }
}

impl From<EntityType> for TypeFilter {
    fn from(entity_type: EntityType) -> Self {
        TypeFilter::One(entity_type)
    }
}

impl From<Vec<EntityType>> for TypeFilter {
    fn from(types: Vec<EntityType>) -> Self {
        TypeFilter::Many(types)
    }
}

/// 同步事件处理器
///
/// 在派发循环中被同步调用；返回错误或 panic 都只影响自身，
/// 不会阻断同一事件派发给其他订阅者，也不会阻断后续事件。
pub trait SyncHandler: Send + Sync {
    /// 处理器名称（即订阅者 ID，用于替换注册与日志）
    fn handler_name(&self) -> &str;
    /// 返回该处理器关心的实体类型
    fn handled_types(&self) -> TypeFilter;
    /// 处理事件
    fn handle(&self, event: &SyncEvent) -> anyhow::Result<()>;
}
