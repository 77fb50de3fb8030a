//! 翻译管道模块
//!
//! 单元分类、载荷编解码、提示词以及批次编排

pub mod attributes;
pub mod batch;
pub mod classifier;
pub mod codec;
pub mod prompts;

// 重新导出主要类型
pub use attributes::{default_allow_list, AttrRule, AttributeAllowList};
pub use batch::{BatchOrchestrator, BatchOutcome, BatchStats, PendingUnit};
pub use classifier::{classify, classify_tag, TagClass, TranslationUnit, TreeClassifier, UnitKind};
pub use codec::{decode_payload, encode_payload, escape_code_reply, raw_code_text};
pub use prompts::{language_name, system_prompt, PromptKind};
