//! 译文校验与属性还原
//!
//! - `ratio`: 长度比校验（含 CJK 放宽）
//! - `structure`: 标签与结构属性一致性校验
//! - `restore`: 按源片段还原不可翻译属性
//!
//! 校验函数都是纯函数，从不返回错误，结果总是一个 [`ValidationResult`]。

pub mod ratio;
pub mod restore;
pub mod structure;

pub use ratio::{contains_cjk, validate_text};
pub use restore::{restore_attributes, restore_attributes_in};
pub use structure::{validate_fragment, validate_fragment_in, DEFAULT_CONTEXT};

/// 校验结果
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub valid: bool,
    pub reason: Option<String>,
    /// 长度比，仅在执行了比值校验时存在
    pub ratio: Option<f64>,
    /// 失败时附带的源片段与译文，便于日志定位
    pub source: Option<String>,
    pub target: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            reason: None,
            ratio: None,
            source: None,
            target: None,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
            ratio: None,
            source: None,
            target: None,
        }
    }

    pub fn with_ratio(mut self, ratio: f64) -> Self {
        self.ratio = Some(ratio);
        self
    }

    /// 失败时附上源片段与译文
    pub fn with_fragments(mut self, source: &str, target: &str) -> Self {
        if !self.valid {
            self.source = Some(source.to_string());
            self.target = Some(target.to_string());
        }
        self
    }

    pub fn reason_or_default(&self) -> &str {
        self.reason.as_deref().unwrap_or("unknown")
    }
}
