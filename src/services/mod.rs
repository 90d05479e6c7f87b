//! 服务层模块

pub mod explainer;
mod llm_service;

pub use llm_service::LlmService;
