//! 账户与站点设置实体
//!
//! 二者不进入访客的可见内容映射，但角色变更与设置更新同样经由总线广播，
//! 供关心它们的订阅者（如会话管理、聊天组件开关）按类型过滤接收。
//!
use serde::{Deserialize, Serialize};
use sync_macros::sync_entity;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Viewer,
    Moderator,
    Admin,
}

#[sync_entity(kind = User, visible = is_active)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub display_name: String,
    pub role: UserRole,
    pub is_active: bool,
}

/// 站点设置（恒可见）
#[sync_entity(kind = Settings)]
#[serde(rename_all = "camelCase")]
pub struct PortalSettings {
    pub site_name: String,
    pub maintenance_mode: bool,
    pub chat_enabled: bool,
}
