//! 翻译模块
//!
//! 采用清晰的模块化架构：
//! - **core**: 任务队列、模型客户端、页面翻译服务
//! - **pipeline**: 单元分类、载荷编解码、提示词、批次编排
//! - **validation**: 译文校验与属性还原
//! - **storage**: 片段缓存
//! - **config**: 配置管理
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use html_translate::translation::{
//!     FragmentCache, OpenAiClient, PageTranslator, RenderedPage, TranslationConfig,
//! };
//!
//! # async fn example() -> html_translate::TranslationResult<()> {
//! let config = TranslationConfig::with_langs("en", &["fr", "ja"]);
//! let cache = Arc::new(FragmentCache::open(config.cache_file()).await);
//! let client = OpenAiClient::new(&config)?;
//! let translator = PageTranslator::new(config, client, Arc::clone(&cache))?;
//!
//! let page = RenderedPage::new("index.html", "<p>Hello world</p>");
//! for record in translator.translate_page(&page).await? {
//!     println!("{} -> {} bytes", record.path.pathname, record.html.len());
//! }
//! cache.close().await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// 子模块声明
// ============================================================================

/// 配置管理模块
pub mod config;

/// 核心模块 - 队列、客户端、页面服务
pub mod core;

/// 错误处理模块
pub mod error;

/// 翻译管道模块
pub mod pipeline;

/// 存储模块 - 片段缓存
pub mod storage;

/// 校验模块
pub mod validation;

// ============================================================================
// 公共API重新导出
// ============================================================================

pub use config::{ConfigManager, TranslationConfig};
pub use self::core::{
    ChatMessage, ChatModel, ChatRequest, GeneratedPage, OpenAiClient, PagePath, PageTranslator,
    RenderedPage, ServiceStatsSnapshot, TaskQueue,
};
pub use error::{ErrorCategory, ErrorSeverity, TranslationError, TranslationResult};
pub use pipeline::{
    classify, BatchOrchestrator, BatchOutcome, BatchStats, PendingUnit, TranslationUnit, UnitKind,
};
pub use storage::{fingerprint, CacheStats, FragmentCache};
pub use validation::{
    restore_attributes, restore_attributes_in, validate_fragment, validate_fragment_in,
    validate_text, ValidationResult,
};
