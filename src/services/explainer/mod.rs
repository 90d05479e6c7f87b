//! 代码讲解模块
//!
//! 为单个源文件生成带行号锚点的讲解文档，并按内容指纹缓存结果
//!
//! # 功能
//!
//! - 指纹：根据（路径, 内容, 详细程度）计算缓存键
//! - 缓存：每个指纹一个 JSON 文件，读写失败都不影响主流程
//! - 会话：一次可取消的模型调用，结果校验为文档结构
//! - 协调：缓存优先，同一时间最多一个生成会话，后到的请求取消先前的会话
//!
//! # 使用示例
//!
//! ```ignore
//! let store = ResultStore::new(ResultStore::default_root());
//! let coordinator = DocumentationCoordinator::new(store, Arc::new(LlmService::new()));
//!
//! let explained = coordinator
//!     .request(ExplainRequest::new("src/main.rs", content, DetailLevel::Beginner))
//!     .await?;
//! ```

mod coordinator;
mod fingerprint;
pub mod prompts;
mod session;
mod store;
pub mod types;

pub use coordinator::{DocumentationCoordinator, ExplainRequest, RequestError};
pub use session::{GenerationError, ModelInvoker};
pub use store::ResultStore;
pub use types::{DetailLevel, Documentation};
