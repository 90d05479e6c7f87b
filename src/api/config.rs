//! 配置管理端点

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{get_config, reload_config, update_config, AppConfig};
use crate::error::AppResult;
use crate::llm::ApiFormat;
use crate::services::explainer::DetailLevel;
use crate::state::AppState;

/// 配置响应（隐藏 api_key 的实际值）
#[derive(Serialize)]
pub struct ConfigResponse {
    /// 是否已设置 API 密钥
    pub api_key_set: bool,
    /// API 基础 URL
    pub base_url: String,
    /// 模型名称
    pub model: String,
    /// 根据模型名推断的 API 格式
    pub api_format: ApiFormat,
    /// 温度参数
    pub temperature: f64,
    /// 最大 token 数
    pub max_tokens: u32,
    /// 自定义缓存目录
    pub cache_dir: Option<String>,
    /// 默认详细程度
    pub default_detail_level: Option<DetailLevel>,
}

impl From<AppConfig> for ConfigResponse {
    fn from(config: AppConfig) -> Self {
        Self {
            api_key_set: !config.api_key.is_empty(),
            api_format: ApiFormat::detect(&config.model),
            base_url: config.base_url,
            model: config.model,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            cache_dir: config.cache_dir,
            default_detail_level: config.default_detail_level,
        }
    }
}

/// 配置更新请求
#[derive(Deserialize)]
pub struct ConfigUpdateRequest {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub default_detail_level: Option<DetailLevel>,
}

/// 获取当前配置
async fn get_config_handler() -> Json<ConfigResponse> {
    Json(ConfigResponse::from(get_config()))
}

/// 更新配置
///
/// 缓存目录只在启动时读取，不支持在线修改
async fn update_config_handler(
    Json(req): Json<ConfigUpdateRequest>,
) -> AppResult<Json<ConfigResponse>> {
    let updated = update_config(|config| {
        if let Some(api_key) = req.api_key {
            config.api_key = api_key;
        }
        if let Some(base_url) = req.base_url {
            config.base_url = base_url;
        }
        if let Some(model) = req.model {
            config.model = model;
        }
        if let Some(temperature) = req.temperature {
            config.temperature = temperature;
        }
        if let Some(max_tokens) = req.max_tokens {
            config.max_tokens = max_tokens;
        }
        if let Some(level) = req.default_detail_level {
            config.default_detail_level = Some(level);
        }
    })?;

    Ok(Json(ConfigResponse::from(updated)))
}

/// 重新读取配置文件
async fn reload_config_handler() -> Json<ConfigResponse> {
    reload_config();
    Json(ConfigResponse::from(get_config()))
}

/// 创建配置路由
pub fn config_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/config", get(get_config_handler).put(update_config_handler))
        .route("/api/config/reload", post(reload_config_handler))
}
