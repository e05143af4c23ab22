use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    Create,
    Update,
    Delete,
    Publish,
    Unpublish,
}

impl SyncAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncAction::Create => "create",
            SyncAction::Update => "update",
            SyncAction::Delete => "delete",
            SyncAction::Publish => "publish",
            SyncAction::Unpublish => "unpublish",
        }
    }

    /// 该动作是否必须携带完整快照（删除与下线允许仅携带标识）
    pub fn requires_snapshot(&self) -> bool {
        matches!(
            self,
            SyncAction::Create | SyncAction::Update | SyncAction::Publish
        )
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
