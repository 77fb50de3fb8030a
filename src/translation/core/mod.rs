//! 翻译系统核心模块
//!
//! - **队列** (`queue.rs`): 有界并发任务队列，模型调用的唯一准入点
//! - **客户端** (`client.rs`): 模型调用接口及 OpenAI 兼容实现
//! - **服务** (`service.rs`): 页面级流程，把各个组件串起来
//!
//! ## 模块依赖关系
//!
//! ```text
//! PageTranslator (service.rs)
//!     ├── TreeClassifier (pipeline/classifier.rs)
//!     ├── FragmentCache (storage/cache.rs)
//!     ├── BatchOrchestrator (pipeline/batch.rs)
//!     │       ├── TaskQueue (queue.rs)
//!     │       ├── ChatModel (client.rs)
//!     │       └── restore / validate (validation/)
//!     └── localize_links (parsers/link_localizer.rs)
//! ```

pub mod client;
pub mod queue;
pub mod service;

pub use client::{ChatMessage, ChatModel, ChatRequest, ChatResponse, OpenAiClient, Role};
pub use queue::TaskQueue;
pub use service::{
    GeneratedPage, PagePath, PageTranslator, RenderedPage, ServiceStats, ServiceStatsSnapshot,
};
