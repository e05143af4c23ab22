//! 门户内容实体：社区帖子、资源、合作伙伴、NGO
//!
use chrono::{DateTime, Utc};
use sync_macros::sync_entity;

/// 社区帖子
#[sync_entity(kind = CommunityPost, visible = is_published)]
#[serde(rename_all = "camelCase")]
pub struct CommunityPost {
    pub title: String,
    pub content: String,
    pub author: String,
    pub category: String,
    pub tags: Vec<String>,
    /// 点赞数（访客端可乐观自增）
    pub likes: u32,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// 心理健康资源（文章、热线、视频等）
#[sync_entity(kind = Resource, visible = is_published)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub title: String,
    pub description: String,
    pub url: String,
    pub category: String,
    /// 浏览数（访客端可乐观自增）
    pub views: u32,
    pub is_published: bool,
}

#[sync_entity(kind = Partner, visible = is_active)]
#[serde(rename_all = "camelCase")]
pub struct Partner {
    pub name: String,
    pub description: String,
    pub website: String,
    pub is_active: bool,
}

#[sync_entity(kind = Ngo, visible = is_active)]
#[serde(rename_all = "camelCase")]
pub struct Ngo {
    pub name: String,
    pub description: String,
    pub contact_email: String,
    pub region: String,
    pub is_active: bool,
}
