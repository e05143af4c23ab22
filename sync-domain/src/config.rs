//! 同步层配置
//!
//! 默认值：派发间隔 2 秒、全量同步间隔 30 秒、队列无界、诊断环形缓冲 50 条。
//! 可通过 `SyncConfig::builder()` 逐项覆写，或由环境变量加载（`from_env`）。
//!
use crate::error::{SyncError, SyncResult};
use bon::Builder;
use std::time::Duration;

pub const ENV_DISPATCH_MS: &str = "PORTAL_SYNC_DISPATCH_MS";
pub const ENV_RESYNC_MS: &str = "PORTAL_SYNC_RESYNC_MS";
pub const ENV_QUEUE_CAPACITY: &str = "PORTAL_SYNC_QUEUE_CAPACITY";
pub const ENV_HISTORY: &str = "PORTAL_SYNC_HISTORY";

/// 诊断缓冲容量上限
pub const MAX_HISTORY_CAPACITY: usize = 10_000;

#[derive(Clone, Debug, PartialEq, Eq, Builder)]
pub struct SyncConfig {
    /// 总线派发循环的 tick 间隔
    #[builder(default = Duration::from_secs(2))]
    pub dispatch_interval: Duration,
    /// 全量同步（兜底自愈）的间隔
    #[builder(default = Duration::from_secs(30))]
    pub resync_interval: Duration,
    /// 队列容量；`None` 表示无界（生产者受人工操作频率限制）
    pub queue_capacity: Option<usize>,
    /// 已派发事件诊断缓冲的容量
    #[builder(default = 50)]
    pub history_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig::builder().build()
    }
}

impl SyncConfig {
    /// 从进程环境变量加载，缺失的键使用默认值
    pub fn from_env() -> SyncResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源加载（便于测试注入）
    pub fn from_lookup<F>(lookup: F) -> SyncResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = SyncConfig::default();

        if let Some(ms) = parse_number(&lookup, ENV_DISPATCH_MS)? {
            config.dispatch_interval = positive_millis(ENV_DISPATCH_MS, ms)?;
        }
        if let Some(ms) = parse_number(&lookup, ENV_RESYNC_MS)? {
            config.resync_interval = positive_millis(ENV_RESYNC_MS, ms)?;
        }
        if let Some(capacity) = parse_number(&lookup, ENV_QUEUE_CAPACITY)? {
            // 0 表示不限制
            config.queue_capacity = (capacity > 0).then(|| saturating_usize(capacity));
        }
        if let Some(history) = parse_number(&lookup, ENV_HISTORY)? {
            let history = saturating_usize(history);
            if history > MAX_HISTORY_CAPACITY {
                return Err(SyncError::Parse {
                    reason: format!("{ENV_HISTORY} must not exceed {MAX_HISTORY_CAPACITY}"),
                });
            }
            config.history_capacity = history;
        }

        Ok(config)
    }
}

fn parse_number<F>(lookup: &F, key: &str) -> SyncResult<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| SyncError::Parse {
                reason: format!("{key}={raw:?}: {e}"),
            }),
    }
}

fn saturating_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

fn positive_millis(key: &str, ms: u64) -> SyncResult<Duration> {
    if ms == 0 {
        return Err(SyncError::Parse {
            reason: format!("{key} must be greater than zero"),
        });
    }
    Ok(Duration::from_millis(ms))
}
