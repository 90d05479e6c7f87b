//! LLM 服务封装
//!
//! 封装 LlmClient，与配置系统集成，作为讲解会话的模型调用实现

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::{get_config, AppConfig};
use crate::llm::{ChatMessage, ChatOptions, LlmClient, LlmError};
use crate::services::explainer::ModelInvoker;

/// LLM 服务
///
/// 每次调用时读取最新配置，设置页修改 API Key 或模型后立即生效。
pub struct LlmService;

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new() -> Self {
        Self
    }

    /// 是否已配置 API 密钥
    pub fn has_credential(&self) -> bool {
        !get_config().api_key.is_empty()
    }

    fn build_client(config: &AppConfig) -> Result<LlmClient, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::ConfigError(
                "API Key not configured. Please set it in Settings.".to_string(),
            ));
        }
        LlmClient::new(&config.api_key, &config.base_url)
    }
}

impl Default for LlmService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelInvoker for LlmService {
    async fn invoke(
        &self,
        prompt: &str,
        transcript: &str,
        cancel: &CancellationToken,
    ) -> Result<String, LlmError> {
        let config = get_config();
        let client = Self::build_client(&config)?;

        let messages = vec![ChatMessage::system(prompt), ChatMessage::user(transcript)];
        let options = ChatOptions {
            temperature: Some(config.temperature),
            max_tokens: Some(config.max_tokens),
            json_mode: true,
        };

        // 取消时直接丢弃进行中的 HTTP 请求
        let completion = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(LlmError::Cancelled);
            }
            result = client.complete(&messages, &config.model, &options) => result?,
        };

        debug!(
            "LLM response received: {} chars, finish_reason={:?}",
            completion.content.len(),
            completion.finish_reason
        );
        Ok(completion.content)
    }
}
