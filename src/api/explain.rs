//! 代码讲解 API 端点
//!
//! 提供讲解生成、缓存查询和取消接口

use axum::{extract::State, routing::post, Json, Router};
use std::sync::Arc;
use tracing::{error, info};

use crate::config::get_config;
use crate::error::{AppError, AppResult};
use crate::models::api::{CancelResponse, CachedQuery, CachedResponse, ExplainBody, ExplainResponse};
use crate::services::explainer::{DetailLevel, ExplainRequest, RequestError};
use crate::state::AppState;

/// 创建讲解路由
pub fn explain_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/explain", post(explain))
        .route("/api/explain/cached", post(cached))
        .route("/api/explain/cancel", post(cancel))
}

/// 确定详细程度：请求优先，其次配置默认值
fn resolve_detail_level(
    requested: Option<DetailLevel>,
    configured: Option<DetailLevel>,
) -> AppResult<DetailLevel> {
    requested.or(configured).ok_or(AppError::MissingDetailLevel)
}

fn require_file_path(file_path: &str) -> AppResult<()> {
    if file_path.trim().is_empty() {
        return Err(AppError::BadRequest("file_path 不能为空".to_string()));
    }
    Ok(())
}

/// 生成（或读取缓存中的）讲解文档
async fn explain(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ExplainBody>,
) -> AppResult<Json<ExplainResponse>> {
    require_file_path(&body.file_path)?;
    let level = resolve_detail_level(body.detail_level, get_config().default_detail_level)?;
    if !state.has_credential() {
        return Err(AppError::MissingCredential);
    }

    info!(
        "Explain request: file={}, level={}, force_refresh={}",
        body.file_path, level, body.force_refresh
    );

    let selected_line = body.line;
    let req = ExplainRequest::new(body.file_path, body.content, level)
        .force_refresh(body.force_refresh);

    match state.coordinator.request(req).await {
        Ok(explained) => {
            let show_notice = !explained.from_cache && state.take_first_generation_notice();
            let highlighted_section =
                selected_line.and_then(|line| explained.documentation.section_for_line(line));
            Ok(Json(ExplainResponse::Completed {
                documentation: explained.documentation,
                from_cache: explained.from_cache,
                fingerprint: explained.fingerprint.to_hex(),
                show_notice,
                highlighted_section,
            }))
        }
        Err(RequestError::Cancelled) => Ok(Json(ExplainResponse::Cancelled {
            message: "Documentation generation was cancelled.".to_string(),
        })),
        Err(RequestError::Generation(e)) => {
            error!("Documentation generation failed: {}", e);
            Err(AppError::Generation(e))
        }
    }
}

/// 查询是否已有缓存（用于决定按钮文字）
async fn cached(
    State(state): State<Arc<AppState>>,
    Json(query): Json<CachedQuery>,
) -> AppResult<Json<CachedResponse>> {
    require_file_path(&query.file_path)?;
    let level = resolve_detail_level(query.detail_level, get_config().default_detail_level)?;
    let cached = state
        .coordinator
        .has_cached(&query.file_path, &query.content, level);
    Ok(Json(CachedResponse::new(cached)))
}

/// 取消正在进行的生成
async fn cancel(State(state): State<Arc<AppState>>) -> Json<CancelResponse> {
    Json(CancelResponse {
        cancelled: state.coordinator.cancel_active(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use crate::services::explainer::{DocumentationCoordinator, ModelInvoker, ResultStore};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    struct StaticInvoker(&'static str);

    #[async_trait]
    impl ModelInvoker for StaticInvoker {
        async fn invoke(
            &self,
            _prompt: &str,
            _transcript: &str,
            _cancel: &CancellationToken,
        ) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }
    }

    fn app(dir: &TempDir, reply: &'static str, has_key: bool) -> Router {
        let coordinator = DocumentationCoordinator::new(
            ResultStore::new(dir.path()),
            Arc::new(StaticInvoker(reply)),
        );
        let state = Arc::new(AppState::new(coordinator, move || has_key));
        explain_routes().with_state(state)
    }

    async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    const VALID: &str = r#"{"sections":[{"lines":[{"start":1,"end":1}],"text":"Adds."}]}"#;

    #[tokio::test]
    async fn test_explain_then_view() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir, VALID, true);
        let body = json!({
            "file_path": "add.js",
            "content": "function add(a,b){return a+b}",
            "detail_level": "beginner"
        });

        let (status, cached) = post_json(&app, "/api/explain/cached", body.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cached["label"], "Generate");

        let (status, first) = post_json(&app, "/api/explain", body.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["status"], "completed");
        assert_eq!(first["from_cache"], false);
        assert_eq!(first["show_notice"], true);
        assert_eq!(first["documentation"]["sections"][0]["text"], "Adds.");

        let (_, second) = post_json(&app, "/api/explain", body.clone()).await;
        assert_eq!(second["from_cache"], true);
        assert_eq!(second["show_notice"], false);
        assert_eq!(second["fingerprint"], first["fingerprint"]);

        let (_, cached) = post_json(&app, "/api/explain/cached", body).await;
        assert_eq!(cached["cached"], true);
        assert_eq!(cached["label"], "View");
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir, VALID, false);

        let (status, body) = post_json(
            &app,
            "/api/explain",
            json!({"file_path": "a.rs", "content": "fn a() {}", "detail_level": "advanced"}),
        )
        .await;

        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_malformed_response_is_bad_gateway() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir, "Sorry, I cannot help with that.", true);
        let body = json!({"file_path": "a.rs", "content": "fn a() {}", "detail_level": "advanced"});

        let (status, error) = post_json(&app, "/api/explain", body.clone()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(error["success"], false);

        let (_, cached) = post_json(&app, "/api/explain/cached", body).await;
        assert_eq!(cached["cached"], false);
    }

    #[tokio::test]
    async fn test_empty_file_path_rejected() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir, VALID, true);

        let (status, body) = post_json(
            &app,
            "/api/explain",
            json!({"file_path": "  ", "content": "fn a() {}", "detail_level": "advanced"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[test]
    fn test_detail_level_falls_back_to_configured_default() {
        assert_eq!(
            resolve_detail_level(Some(DetailLevel::Advanced), Some(DetailLevel::Beginner)).unwrap(),
            DetailLevel::Advanced
        );
        assert_eq!(
            resolve_detail_level(None, Some(DetailLevel::Beginner)).unwrap(),
            DetailLevel::Beginner
        );
        assert!(matches!(
            resolve_detail_level(None, None),
            Err(AppError::MissingDetailLevel)
        ));
    }

    #[tokio::test]
    async fn test_missing_detail_level_rejected() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir, VALID, true);

        // 测试环境下没有配置文件，因此也没有默认详细程度
        if get_config().default_detail_level.is_some() {
            return;
        }

        let (status, body) = post_json(
            &app,
            "/api/explain",
            json!({"file_path": "a.rs", "content": "fn a() {}"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, _) = post_json(
            &app,
            "/api/explain/cached",
            json!({"file_path": "a.rs", "content": "fn a() {}"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_selected_line_highlights_section() {
        let dir = TempDir::new().unwrap();
        let reply = r#"{"sections":[
            {"lines":[{"start":1,"end":1}],"text":"Signature."},
            {"lines":[{"start":2,"end":3}],"text":"Body."}
        ]}"#;
        let app = app(&dir, reply, true);
        let content = "fn add(a: i32, b: i32) -> i32 {\n    a + b\n}";

        let (status, body) = post_json(
            &app,
            "/api/explain",
            json!({"file_path": "add.rs", "content": content, "detail_level": "beginner", "line": 3}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["highlighted_section"], 1);

        let (_, body) = post_json(
            &app,
            "/api/explain",
            json!({"file_path": "add.rs", "content": content, "detail_level": "beginner", "line": 9}),
        )
        .await;
        assert_eq!(body["from_cache"], true);
        assert!(body["highlighted_section"].is_null());
    }

    #[tokio::test]
    async fn test_cancel_without_active_session() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir, VALID, true);

        let (status, body) = post_json(&app, "/api/explain/cancel", Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cancelled"], false);
    }
}
