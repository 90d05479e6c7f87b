//! 缓存管理端点

use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;
use tracing::info;

use crate::models::api::{CacheStatsResponse, ClearCacheResponse};
use crate::state::AppState;

/// 缓存统计
async fn cache_stats(State(state): State<Arc<AppState>>) -> Json<CacheStatsResponse> {
    let coordinator = &state.coordinator;
    Json(CacheStatsResponse {
        entries: coordinator.cached_entries(),
        root: coordinator.store().root().display().to_string(),
        generating: coordinator.is_generating(),
    })
}

/// 清空缓存
async fn clear_cache(State(state): State<Arc<AppState>>) -> Json<ClearCacheResponse> {
    let removed = state.coordinator.clear_cache();
    info!("Cache cleared via API: {} entries", removed);
    Json(ClearCacheResponse { removed })
}

/// 创建缓存管理路由
pub fn cache_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/cache", get(cache_stats).delete(clear_cache))
}
