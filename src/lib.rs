//! # html-translate
//!
//! 把渲染好的 HTML 页面翻译成多种目标语言，同时保留标记结构。
//!
//! ## 模块组织
//!
//! - `env` - 类型安全的环境变量访问
//! - `parsers` - HTML 解析/序列化适配层与链接本地化
//! - `translation` - 翻译管道（分类、编码、校验、缓存、批次、队列、页面流程）

pub mod env;
pub mod parsers;
pub mod translation;

// Re-export commonly used items for convenience
pub use parsers::{html_to_dom, localize_links, serialize_document};
pub use translation::{
    ChatModel, FragmentCache, GeneratedPage, OpenAiClient, PageTranslator, RenderedPage,
    TranslationConfig, TranslationError, TranslationResult,
};
