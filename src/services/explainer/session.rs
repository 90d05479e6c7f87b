//! 单次生成会话
//!
//! 负责一次模型调用：选择 Prompt、生成带行号的转写、在取消令牌下调用模型、
//! 校验响应结构，最终得到 Completed / Failed / Cancelled 三种结果之一。

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::prompts::{numbered_transcript, prompt_for_level};
use super::types::{DetailLevel, Documentation, DocumentationSection};
use crate::llm::LlmError;

/// 模型调用接口
///
/// 返回模型的原始文本，期望其中包含 `{"sections": [...]}` 结构的 JSON。
/// 实现方应在 `cancel` 被触发时尽快放弃网络请求。
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    async fn invoke(
        &self,
        prompt: &str,
        transcript: &str,
        cancel: &CancellationToken,
    ) -> Result<String, LlmError>;
}

/// 生成错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// 网络、鉴权、限流等传输层错误
    #[error("模型调用失败: {0}")]
    Transport(String),

    /// 模型返回的数据不符合文档结构
    #[error("模型返回了无法识别的文档结构: {0}")]
    MalformedResponse(String),
}

/// 会话终态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed(Documentation),
    Failed(GenerationError),
    Cancelled,
}

/// 模型响应的原始结构，`sections` 缺失即视为格式错误
#[derive(Deserialize)]
struct RawDocumentation {
    sections: Option<Vec<DocumentationSection>>,
}

/// 单次生成会话
///
/// 每个会话持有独立的取消令牌，不在会话之间复用。
pub struct GenerationSession {
    id: u64,
    cancel: CancellationToken,
}

impl GenerationSession {
    pub fn new(id: u64, cancel: CancellationToken) -> Self {
        Self { id, cancel }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// 执行一次生成
    pub async fn run(
        &self,
        content: &str,
        level: DetailLevel,
        invoker: &dyn ModelInvoker,
    ) -> SessionOutcome {
        if self.cancel.is_cancelled() {
            return SessionOutcome::Cancelled;
        }

        let prompt = prompt_for_level(level);
        let transcript = numbered_transcript(content);
        info!(
            "Generation session {} started: level={}, lines={}",
            self.id,
            level,
            content.lines().count()
        );

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                info!("Generation session {} cancelled while waiting for the model", self.id);
                return SessionOutcome::Cancelled;
            }
            result = invoker.invoke(&prompt, &transcript, &self.cancel) => result,
        };

        // 调用返回后才发现已取消：丢弃结果。
        // 此检查之后才到达的取消不再生效，结果仍按自身指纹写入缓存。
        if self.cancel.is_cancelled() {
            info!("Generation session {} cancelled, discarding late result", self.id);
            return SessionOutcome::Cancelled;
        }

        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Generation session {} failed: {}", self.id, e);
                return SessionOutcome::Failed(GenerationError::Transport(e.to_string()));
            }
        };

        match parse_documentation(&raw) {
            Ok(doc) => {
                if doc.is_empty() {
                    warn!("Generation session {} produced no sections", self.id);
                }
                let odd_ranges = doc
                    .sections
                    .iter()
                    .flat_map(|section| &section.lines)
                    .filter(|range| !range.is_well_formed())
                    .count();
                if odd_ranges > 0 {
                    debug!(
                        "Generation session {} kept {} out-of-order line ranges as returned",
                        self.id, odd_ranges
                    );
                }
                info!(
                    "Generation session {} completed: {} sections",
                    self.id,
                    doc.sections.len()
                );
                SessionOutcome::Completed(doc)
            }
            Err(e) => {
                warn!("Generation session {} returned malformed response: {}", self.id, e);
                SessionOutcome::Failed(e)
            }
        }
    }
}

/// 解析模型输出为文档
///
/// 容忍 ```json 代码块或前后多余文字，但要求顶层存在 `sections` 数组。
/// 行号范围原样保留，不做裁剪。
pub fn parse_documentation(raw: &str) -> Result<Documentation, GenerationError> {
    let json = extract_json_object(raw)
        .ok_or_else(|| GenerationError::MalformedResponse("response contains no JSON object".to_string()))?;

    let parsed: RawDocumentation = serde_json::from_str(json)
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

    match parsed.sections {
        Some(sections) => Ok(Documentation::new(sections)),
        None => Err(GenerationError::MalformedResponse(
            "missing required field `sections`".to_string(),
        )),
    }
}

/// 从响应文本中截取 JSON 对象
///
/// 段落文本里本身可能带有代码块，所以只剥离包裹整个响应的代码块，
/// 其余情况取第一个 `{` 到最后一个 `}`。
fn extract_json_object(raw: &str) -> Option<&str> {
    let mut body = raw.trim();
    if let Some(rest) = body.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        body = rest.trim_end().strip_suffix("```").unwrap_or(rest);
    }

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end < start {
        debug!("Unbalanced braces in model response");
        return None;
    }
    Some(&body[start..=end])
}
