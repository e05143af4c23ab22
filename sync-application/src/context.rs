/// 管理端调用上下文
///
/// 承载一次管理操作的横切信息：
/// - `admin_id`：执行变更的管理员，写入事件的 `origin_id`，仅用于审计与调试；
/// - `request_id`：可选的请求标识，用于日志关联。
///
/// ```rust
/// use sync_application::context::AdminContext;
///
/// let ctx = AdminContext::new("admin-1").with_request_id("req-42");
/// assert_eq!(ctx.admin_id, "admin-1");
/// ```
#[derive(Clone, Debug, Default)]
pub struct AdminContext {
    pub admin_id: String,
    pub request_id: Option<String>,
}

impl AdminContext {
    pub fn new(admin_id: impl Into<String>) -> Self {
        Self {
            admin_id: admin_id.into(),
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}
