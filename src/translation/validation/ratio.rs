//! 长度比校验

use super::ValidationResult;
use crate::translation::config::constants;

/// 是否包含 CJK 字符（平假名、片假名及扩展、CJK 统一表意文字、兼容字符）
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(
            c as u32,
            0x3040..=0x309F
                | 0x30A0..=0x30FF
                | 0x31F0..=0x31FF
                | 0x3300..=0x33FF
                | 0x4E00..=0x9FAF
                | 0xF900..=0xFAFF
        )
    })
}

/// 长度比校验
///
/// 源文本不含空白或长度不超过阈值时直接通过。
pub fn check_ratio(source: &str, target: &str) -> ValidationResult {
    let source = source.trim();
    let target = target.trim();
    let source_len = source.chars().count();

    if !source.chars().any(char::is_whitespace) || source_len <= constants::SHORT_TEXT_THRESHOLD {
        return ValidationResult::ok();
    }

    let ratio = target.chars().count() as f64 / source_len as f64;
    let (min, max) = if contains_cjk(source) || contains_cjk(target) {
        (constants::CJK_MIN_LENGTH_RATIO, constants::CJK_MAX_LENGTH_RATIO)
    } else {
        (constants::MIN_LENGTH_RATIO, constants::MAX_LENGTH_RATIO)
    };

    if ratio < min {
        ValidationResult::invalid(format!("translation too short (ratio {:.2})", ratio))
            .with_ratio(ratio)
    } else if ratio > max {
        ValidationResult::invalid(format!("translation too long (ratio {:.2})", ratio))
            .with_ratio(ratio)
    } else {
        ValidationResult::ok().with_ratio(ratio)
    }
}

/// 纯文本校验：空译文检查 + 长度比
pub fn validate_text(source: &str, target: &str) -> ValidationResult {
    let result = if target.trim().is_empty() && !source.trim().is_empty() {
        ValidationResult::invalid("translation is empty")
    } else {
        check_ratio(source, target)
    };
    result.with_fragments(source, target)
}
