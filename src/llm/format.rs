//! API 格式检测和端点构建

use serde::{Deserialize, Serialize};

/// API 格式枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiFormat {
    /// OpenAI Chat Completions API
    OpenAi,
    /// Anthropic Messages API
    Anthropic,
}

impl ApiFormat {
    /// 根据模型名称检测 API 格式
    ///
    /// 模型名包含 "claude" 使用 Anthropic 格式，否则使用 OpenAI 格式
    pub fn detect(model: &str) -> Self {
        if model.to_lowercase().contains("claude") {
            Self::Anthropic
        } else {
            Self::OpenAi
        }
    }

    /// 该格式的端点路径后缀
    fn path_suffix(&self) -> &'static str {
        match self {
            Self::OpenAi => "/chat/completions",
            Self::Anthropic => "/messages",
        }
    }

    /// 构建完整端点
    ///
    /// 已包含完整路径时原样返回；以 `/v1` 结尾时只补后缀；否则补 `/v1` + 后缀
    pub fn endpoint(&self, base_url: &str) -> String {
        let url = normalize_base_url(base_url);
        let suffix = self.path_suffix();

        if url.ends_with(suffix) {
            url
        } else if url.ends_with("/v1") {
            format!("{}{}", url, suffix)
        } else {
            format!("{}/v1{}", url, suffix)
        }
    }
}

/// 规范化 base_url：去掉末尾斜杠，合并协议之后的重复斜杠
pub fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');

    match trimmed.split_once("://") {
        Some((scheme, rest)) => {
            let mut path = rest.to_string();
            while path.contains("//") {
                path = path.replace("//", "/");
            }
            format!("{}://{}", scheme, path)
        }
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(ApiFormat::detect("gpt-4o-mini"), ApiFormat::OpenAi);
        assert_eq!(ApiFormat::detect("claude-3-5-sonnet"), ApiFormat::Anthropic);
        assert_eq!(ApiFormat::detect("Claude-Haiku"), ApiFormat::Anthropic);
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("https://api.openai.com/"), "https://api.openai.com");
        assert_eq!(normalize_base_url("https://proxy.local///v1/"), "https://proxy.local/v1");
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(
            ApiFormat::OpenAi.endpoint("https://api.openai.com"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            ApiFormat::OpenAi.endpoint("https://example.com/v1/chat/completions"),
            "https://example.com/v1/chat/completions"
        );
        assert_eq!(
            ApiFormat::Anthropic.endpoint("https://api.anthropic.com/v1"),
            "https://api.anthropic.com/v1/messages"
        );
    }
}
