//! 存储模块
//!
//! 提供按内容寻址的片段缓存及其持久化。

pub mod cache;

pub use cache::{fingerprint, CacheStats, FragmentCache};
