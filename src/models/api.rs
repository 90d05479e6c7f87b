//! REST API 请求/响应模型

use serde::{Deserialize, Serialize};

use crate::services::explainer::{DetailLevel, Documentation};

/// 讲解请求
#[derive(Debug, Deserialize)]
pub struct ExplainBody {
    /// 文件路径（参与缓存键计算）
    pub file_path: String,
    /// 文件内容
    pub content: String,
    /// 详细程度，缺省时使用配置中的默认值
    pub detail_level: Option<DetailLevel>,
    /// 是否忽略缓存重新生成
    #[serde(default)]
    pub force_refresh: bool,
    /// 编辑器中当前选中的行（1 起始），用于定位需要高亮的段落
    #[serde(default)]
    pub line: Option<u32>,
}

/// 讲解响应
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExplainResponse {
    /// 成功（生成或命中缓存）
    Completed {
        documentation: Documentation,
        from_cache: bool,
        fingerprint: String,
        /// 是否展示首次生成提示
        show_notice: bool,
        /// 覆盖选中行的第一个段落下标
        highlighted_section: Option<usize>,
    },
    /// 已取消（提示信息，不是错误）
    Cancelled { message: String },
}

/// 缓存查询请求
#[derive(Debug, Deserialize)]
pub struct CachedQuery {
    pub file_path: String,
    pub content: String,
    pub detail_level: Option<DetailLevel>,
}

/// 缓存查询响应
#[derive(Debug, Serialize)]
pub struct CachedResponse {
    pub cached: bool,
    /// 按钮文字："View" 或 "Generate"
    pub label: &'static str,
}

impl CachedResponse {
    pub fn new(cached: bool) -> Self {
        Self {
            cached,
            label: if cached { "View" } else { "Generate" },
        }
    }
}

/// 取消响应
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

/// 缓存统计
#[derive(Debug, Serialize)]
pub struct CacheStatsResponse {
    pub entries: usize,
    pub root: String,
    pub generating: bool,
}

/// 清空缓存响应
#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
    pub removed: usize,
}
