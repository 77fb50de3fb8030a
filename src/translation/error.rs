//! 翻译模块统一错误处理
//!
//! 错误分为几类：配置错误（致命，不重试）、传输错误、契约错误（缺失的
//! chunk、响应无法解码）、校验错误、对账错误（页面缺少译文）以及缓存 I/O 错误。
//! 除配置错误外，任何错误都不会终止整个运行。

use std::fmt;

use thiserror::Error;

/// 翻译错误类型
#[derive(Error, Debug, Clone)]
pub enum TranslationError {
    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 网络错误
    #[error("网络错误: {0}")]
    NetworkError(String),

    /// 非 2xx 响应
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// 响应中缺少预期的 chunk
    #[error("响应缺少 chunk {0}")]
    MissingChunk(usize),

    /// 解析错误
    #[error("解析错误: {0}")]
    ParseError(String),

    /// 译文未通过校验
    #[error("校验失败: {0}")]
    ValidationFailed(String),

    /// 缓存错误
    #[error("缓存错误: {0}")]
    CacheError(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    SerializationError(String),

    /// 并发错误
    #[error("并发操作错误: {0}")]
    ConcurrencyError(String),

    /// 文件读写错误
    #[error("IO错误: {0}")]
    IoError(String),

    /// 页面存在未解析的翻译单元
    #[error("{missing} 个翻译单元没有译文")]
    IncompletePage { missing: usize },
}

impl TranslationError {
    /// 检查错误是否可重试
    ///
    /// 传输、契约、校验错误都走整块重试；配置错误永不重试。
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslationError::NetworkError(_) => true,
            TranslationError::HttpStatus { .. } => true,
            TranslationError::MissingChunk(_) => true,
            TranslationError::ParseError(_) => true,
            TranslationError::ValidationFailed(_) => true,
            TranslationError::SerializationError(_) => true,
            TranslationError::ConcurrencyError(_) => false,
            TranslationError::ConfigError(_) => false,
            TranslationError::CacheError(_) => false,
            TranslationError::IoError(_) => false,
            TranslationError::IncompletePage { .. } => false,
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TranslationError::ConfigError(_) => ErrorSeverity::Critical,
            TranslationError::NetworkError(_) => ErrorSeverity::Warning,
            TranslationError::HttpStatus { .. } => ErrorSeverity::Warning,
            TranslationError::MissingChunk(_) => ErrorSeverity::Warning,
            TranslationError::ParseError(_) => ErrorSeverity::Warning,
            TranslationError::ValidationFailed(_) => ErrorSeverity::Warning,
            TranslationError::CacheError(_) => ErrorSeverity::Warning,
            TranslationError::SerializationError(_) => ErrorSeverity::Error,
            TranslationError::ConcurrencyError(_) => ErrorSeverity::Error,
            TranslationError::IoError(_) => ErrorSeverity::Error,
            TranslationError::IncompletePage { .. } => ErrorSeverity::Warning,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            TranslationError::ConfigError(_) => ErrorCategory::Configuration,
            TranslationError::NetworkError(_) | TranslationError::HttpStatus { .. } => {
                ErrorCategory::Transport
            }
            TranslationError::MissingChunk(_) | TranslationError::ParseError(_) => {
                ErrorCategory::Contract
            }
            TranslationError::ValidationFailed(_) => ErrorCategory::Validation,
            TranslationError::IncompletePage { .. } => ErrorCategory::Reconciliation,
            TranslationError::CacheError(_) | TranslationError::IoError(_) => ErrorCategory::Cache,
            TranslationError::SerializationError(_) => ErrorCategory::Serialization,
            TranslationError::ConcurrencyError(_) => ErrorCategory::Concurrency,
        }
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(self, context: T) -> Self {
        let wrap = |msg: String| format!("{} (上下文: {})", msg, context);

        match self {
            TranslationError::ConfigError(msg) => TranslationError::ConfigError(wrap(msg)),
            TranslationError::NetworkError(msg) => TranslationError::NetworkError(wrap(msg)),
            TranslationError::ParseError(msg) => TranslationError::ParseError(wrap(msg)),
            TranslationError::ValidationFailed(msg) => {
                TranslationError::ValidationFailed(wrap(msg))
            }
            TranslationError::CacheError(msg) => TranslationError::CacheError(wrap(msg)),
            TranslationError::SerializationError(msg) => {
                TranslationError::SerializationError(wrap(msg))
            }
            TranslationError::ConcurrencyError(msg) => {
                TranslationError::ConcurrencyError(wrap(msg))
            }
            TranslationError::IoError(msg) => TranslationError::IoError(wrap(msg)),
            other => other,
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Warning,
    Error,
    Critical,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    Transport,
    Contract,
    Validation,
    Reconciliation,
    Cache,
    Serialization,
    Concurrency,
}

/// 标准错误转换
impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        TranslationError::IoError(error.to_string())
    }
}

impl From<serde_json::Error> for TranslationError {
    fn from(error: serde_json::Error) -> Self {
        TranslationError::SerializationError(format!("JSON序列化错误: {}", error))
    }
}

impl From<toml::de::Error> for TranslationError {
    fn from(error: toml::de::Error) -> Self {
        TranslationError::ConfigError(format!("TOML解析错误: {}", error))
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            TranslationError::HttpStatus {
                status: status.as_u16(),
                body: error.to_string(),
            }
        } else if error.is_decode() {
            TranslationError::ParseError(format!("响应解码失败: {}", error))
        } else {
            TranslationError::NetworkError(error.to_string())
        }
    }
}

/// 错误结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 按严重程度记录错误
    pub fn log_error(error: &TranslationError) {
        match error.severity() {
            ErrorSeverity::Warning => tracing::warn!("翻译警告: {}", error),
            ErrorSeverity::Error => tracing::error!("翻译错误: {}", error),
            ErrorSeverity::Critical => tracing::error!("翻译严重错误: {}", error),
        }
    }
}
