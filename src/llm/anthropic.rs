//! Anthropic Messages API 调用

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::format::ApiFormat;
use super::types::{ChatMessage, ChatOptions, Completion, LlmError};

/// 未指定时的最大 token 数（Anthropic 要求必填）
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Anthropic 请求载荷
#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    messages: Vec<&'a ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

/// Anthropic 响应
#[derive(Deserialize, Debug)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContentBlock>,
    stop_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct AnthropicContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

/// 调用 Anthropic API
///
/// system 消息合并到顶层 `system` 字段；Anthropic 没有 JSON 模式，
/// 输出格式完全依赖 Prompt 约束，由调用方负责提取 JSON。
pub async fn complete_anthropic(
    client: &Client,
    api_key: &str,
    base_url: &str,
    messages: &[ChatMessage],
    model: &str,
    options: &ChatOptions,
) -> Result<Completion, LlmError> {
    let endpoint = ApiFormat::Anthropic.endpoint(base_url);

    let system_parts: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == "system")
        .map(|m| m.content.as_str())
        .collect();
    let system = (!system_parts.is_empty()).then(|| system_parts.join("\n\n"));

    let payload = AnthropicRequest {
        model,
        messages: messages.iter().filter(|m| m.role != "system").collect(),
        system,
        max_tokens: options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        temperature: options.temperature,
    };

    debug!("Anthropic API request: endpoint={}, model={}", endpoint, model);

    let response = client
        .post(&endpoint)
        .header("x-api-key", api_key)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("anthropic-version", "2023-06-01")
        .json(&payload)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        error!(
            "Anthropic API error: status={}, body={}",
            status.as_u16(),
            error_text.chars().take(500).collect::<String>()
        );
        return Err(LlmError::ApiError {
            status: status.as_u16(),
            message: error_text,
        });
    }

    let body: AnthropicResponse = serde_json::from_str(&response.text().await?)?;
    let content: String = body
        .content
        .into_iter()
        .filter(|block| block.block_type == "text")
        .filter_map(|block| block.text)
        .collect();

    if content.is_empty() {
        return Err(LlmError::EmptyResponse);
    }

    Ok(Completion {
        content,
        finish_reason: body.stop_reason,
    })
}
