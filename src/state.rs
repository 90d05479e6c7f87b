//! 应用状态管理
//!
//! 定义在请求处理器之间共享的状态。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::get_config;
use crate::services::explainer::{DocumentationCoordinator, ModelInvoker, ResultStore};
use crate::services::LlmService;

/// 应用共享状态
///
/// 使用 Arc 包裹以便在多个处理器之间安全共享
pub struct AppState {
    /// 讲解文档协调器
    pub coordinator: DocumentationCoordinator,
    /// 是否已配置 API 密钥
    credential_check: Box<dyn Fn() -> bool + Send + Sync>,
    /// 首次生成成功后的提示是否已展示（进程内只展示一次）
    notice_shown: AtomicBool,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(
        coordinator: DocumentationCoordinator,
        credential_check: impl Fn() -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            coordinator,
            credential_check: Box::new(credential_check),
            notice_shown: AtomicBool::new(false),
        }
    }

    /// 是否已配置 API 密钥
    pub fn has_credential(&self) -> bool {
        (self.credential_check)()
    }

    /// 首次调用返回 true，之后一直返回 false
    pub fn take_first_generation_notice(&self) -> bool {
        !self.notice_shown.swap(true, Ordering::SeqCst)
    }
}

/// 创建可共享的应用状态
///
/// 缓存目录取自配置，未配置时使用用户缓存目录
pub fn create_shared_state() -> Arc<AppState> {
    let root = get_config()
        .cache_root()
        .unwrap_or_else(ResultStore::default_root);

    let llm = Arc::new(LlmService::new());
    let credential_source = Arc::clone(&llm);
    let invoker: Arc<dyn ModelInvoker> = llm;

    let coordinator = DocumentationCoordinator::new(ResultStore::new(root), invoker);
    Arc::new(AppState::new(coordinator, move || {
        credential_source.has_credential()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    struct NoopInvoker;

    #[async_trait]
    impl ModelInvoker for NoopInvoker {
        async fn invoke(
            &self,
            _prompt: &str,
            _transcript: &str,
            _cancel: &CancellationToken,
        ) -> Result<String, LlmError> {
            Ok(r#"{"sections":[]}"#.to_string())
        }
    }

    #[test]
    fn test_notice_shown_once() {
        let dir = tempfile::TempDir::new().unwrap();
        let coordinator =
            DocumentationCoordinator::new(ResultStore::new(dir.path()), Arc::new(NoopInvoker));
        let state = AppState::new(coordinator, || true);

        assert!(state.has_credential());
        assert!(state.take_first_generation_notice());
        assert!(!state.take_first_generation_notice());
        assert!(!state.take_first_generation_notice());
    }
}
