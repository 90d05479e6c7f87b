//! 讲解文档协调器
//!
//! 对外唯一入口：先查缓存，未命中（或强制刷新）时启动一次生成会话。
//! 同一协调器同时最多只有一个活跃会话，新请求会先取消旧会话（后到者胜出）。

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::fingerprint::Fingerprint;
use super::session::{GenerationError, GenerationSession, ModelInvoker, SessionOutcome};
use super::store::ResultStore;
use super::types::{DetailLevel, Documentation};

/// 讲解请求
#[derive(Debug, Clone)]
pub struct ExplainRequest {
    pub file_path: String,
    pub content: String,
    pub detail_level: DetailLevel,
    /// 忽略缓存，强制重新生成
    pub force_refresh: bool,
}

impl ExplainRequest {
    pub fn new(
        file_path: impl Into<String>,
        content: impl Into<String>,
        detail_level: DetailLevel,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            content: content.into(),
            detail_level,
            force_refresh: false,
        }
    }

    pub fn force_refresh(mut self, force: bool) -> Self {
        self.force_refresh = force;
        self
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::compute(&self.file_path, &self.content, self.detail_level)
    }
}

/// 讲解结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explained {
    pub documentation: Documentation,
    /// 是否直接来自缓存
    pub from_cache: bool,
    pub fingerprint: Fingerprint,
}

/// 请求错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// 用户取消或被新请求取代，不属于错误
    #[error("生成已取消")]
    Cancelled,

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// 当前活跃会话
struct ActiveSession {
    id: u64,
    cancel: CancellationToken,
}

/// 请求结束（包括 future 被丢弃）时释放活跃会话槽位
struct SessionSlot<'a> {
    coordinator: &'a DocumentationCoordinator,
    id: u64,
}

impl Drop for SessionSlot<'_> {
    fn drop(&mut self) {
        self.coordinator.end_session(self.id);
    }
}

/// 讲解文档协调器
pub struct DocumentationCoordinator {
    store: ResultStore,
    invoker: Arc<dyn ModelInvoker>,
    active: Mutex<Option<ActiveSession>>,
    next_session_id: AtomicU64,
}

impl DocumentationCoordinator {
    pub fn new(store: ResultStore, invoker: Arc<dyn ModelInvoker>) -> Self {
        Self {
            store,
            invoker,
            active: Mutex::new(None),
            next_session_id: AtomicU64::new(1),
        }
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// 获取讲解文档（优先使用缓存）
    pub async fn request(&self, req: ExplainRequest) -> Result<Explained, RequestError> {
        self.request_with_cancel(req, CancellationToken::new()).await
    }

    /// 获取讲解文档，调用方可通过 `cancel` 随时取消
    ///
    /// 会话使用 `cancel` 的子令牌：调用方取消会传递到会话，
    /// 被新请求取代时只取消子令牌，不影响调用方自己的令牌。
    pub async fn request_with_cancel(
        &self,
        req: ExplainRequest,
        cancel: CancellationToken,
    ) -> Result<Explained, RequestError> {
        let fingerprint = req.fingerprint();

        if !req.force_refresh {
            if let Some(documentation) = self.store.load(&fingerprint) {
                debug!("Serving {} from cache ({})", req.file_path, fingerprint);
                return Ok(Explained {
                    documentation,
                    from_cache: true,
                    fingerprint,
                });
            }
        }

        let session = self.begin_session(cancel.child_token());
        info!(
            "Generating documentation for {} (session {}, level={}, force_refresh={})",
            req.file_path,
            session.id(),
            req.detail_level,
            req.force_refresh
        );

        let slot = SessionSlot {
            coordinator: self,
            id: session.id(),
        };
        let outcome = session
            .run(&req.content, req.detail_level, self.invoker.as_ref())
            .await;
        drop(slot);

        match outcome {
            SessionOutcome::Completed(documentation) => {
                // 缓存写入失败不影响本次结果
                self.store.save(&fingerprint, &documentation);
                Ok(Explained {
                    documentation,
                    from_cache: false,
                    fingerprint,
                })
            }
            SessionOutcome::Cancelled => Err(RequestError::Cancelled),
            SessionOutcome::Failed(e) => Err(RequestError::Generation(e)),
        }
    }

    /// 登记新会话，先取消仍在进行中的旧会话
    fn begin_session(&self, cancel: CancellationToken) -> GenerationSession {
        let id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        let mut active = self.active.lock();

        if let Some(previous) = active.take() {
            info!("Cancelling session {} in favour of session {}", previous.id, id);
            previous.cancel.cancel();
        }

        *active = Some(ActiveSession {
            id,
            cancel: cancel.clone(),
        });
        GenerationSession::new(id, cancel)
    }

    /// 会话结束，仅在槽位仍属于该会话时清空
    fn end_session(&self, id: u64) {
        let mut active = self.active.lock();
        if active.as_ref().is_some_and(|s| s.id == id) {
            *active = None;
        }
    }

    /// 是否存在缓存（不反序列化，用于决定按钮文字）
    pub fn has_cached(&self, file_path: &str, content: &str, level: DetailLevel) -> bool {
        self.store.exists(&Fingerprint::compute(file_path, content, level))
    }

    /// 取消当前活跃会话，返回是否真的取消了某个会话
    pub fn cancel_active(&self) -> bool {
        match self.active.lock().as_ref() {
            Some(session) => {
                info!("Cancelling active session {}", session.id);
                session.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// 是否有会话正在生成
    pub fn is_generating(&self) -> bool {
        self.active.lock().is_some()
    }

    /// 缓存条目数量
    pub fn cached_entries(&self) -> usize {
        self.store.entry_count()
    }

    /// 清空缓存
    pub fn clear_cache(&self) -> usize {
        self.store.clear()
    }
}
