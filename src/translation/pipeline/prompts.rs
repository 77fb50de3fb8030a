//! 系统提示词
//!
//! 两种变体：普通文本提示词与代码块提示词。一个 chunk 只会用其中一种。

use crate::translation::config::constants;

/// 提示词变体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    Text,
    Code,
}

/// 语言代码的显示名，未知代码原样返回
pub fn language_name(code: &str) -> &str {
    match code.to_ascii_lowercase().as_str() {
        "en" => "English",
        "zh" | "zh-cn" | "zh-hans" => "Simplified Chinese",
        "zh-tw" | "zh-hant" => "Traditional Chinese",
        "ja" => "Japanese",
        "ko" => "Korean",
        "fr" => "French",
        "de" => "German",
        "es" => "Spanish",
        "pt" => "Portuguese",
        "pt-br" => "Brazilian Portuguese",
        "it" => "Italian",
        "ru" => "Russian",
        "ar" => "Arabic",
        "hi" => "Hindi",
        "nl" => "Dutch",
        "pl" => "Polish",
        "tr" => "Turkish",
        "vi" => "Vietnamese",
        "uk" => "Ukrainian",
        "id" => "Indonesian",
        _ => code,
    }
}

/// 构造系统提示词
pub fn system_prompt(kind: PromptKind, source_lang: &str, target_lang: &str) -> String {
    let source = language_name(source_lang);
    let target = language_name(target_lang);

    let mut lines = vec![
        format!(
            "You are a professional translator. Translate from {} to {}.",
            source, target
        ),
        "The input is a list of <chunk id=\"N\">...</chunk> elements, each holding an HTML fragment."
            .to_string(),
        "Reply with exactly one <chunk id=\"N\">...</chunk> per input chunk, keeping every id unchanged. Output nothing else."
            .to_string(),
    ];

    match kind {
        PromptKind::Text => {
            lines.push(
                "Translate only human-readable text. Keep every HTML tag, its order and nesting exactly as given."
                    .to_string(),
            );
            lines.push(format!(
                "Attribute values may be translated only for these attributes: {}. Copy every other attribute (href, src, class, id, style, data-*, ...) verbatim.",
                plain_translatable_attrs().join(", ")
            ));
            lines.push(
                "Write tags as real markup. Never escape them as HTML entities such as &lt; or &gt;."
                    .to_string(),
            );
        }
        PromptKind::Code => {
            lines.push("Each chunk is a source code block.".to_string());
            lines.push(
                "Translate only code comments and user-facing text inside string literals."
                    .to_string(),
            );
            lines.push(
                "Never change identifiers, keywords, operators, punctuation, indentation or HTML tags."
                    .to_string(),
            );
            lines.push(
                "If a block contains nothing translatable, return it unchanged.".to_string(),
            );
            lines.push(
                "The code is plain text: write `<`, `>` and `&` as raw characters, never as `&lt;`, `&gt;` or `&amp;`."
                    .to_string(),
            );
        }
    }

    lines.join("\n")
}

fn plain_translatable_attrs() -> Vec<&'static str> {
    constants::TRANSLATABLE_ATTRS
        .iter()
        .map(|entry| match entry.rsplit_once("]:") {
            Some((_, attr)) => attr,
            None if entry.starts_with("meta[") => "content",
            None => entry,
        })
        .fold(Vec::new(), |mut acc, attr| {
            if !acc.contains(&attr) {
                acc.push(attr);
            }
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_names() {
        assert_eq!(language_name("fr"), "French");
        assert_eq!(language_name("ZH-CN"), "Simplified Chinese");
        assert_eq!(language_name("tlh"), "tlh");
    }

    #[test]
    fn test_text_prompt_mentions_languages_and_attrs() {
        let prompt = system_prompt(PromptKind::Text, "en", "ja");
        assert!(prompt.contains("from English to Japanese"));
        assert!(prompt.contains("aria-label"));
        assert!(prompt.contains("value"));
        assert!(prompt.contains("&lt;"));
    }

    #[test]
    fn test_code_prompt_restricts_to_comments() {
        let prompt = system_prompt(PromptKind::Code, "en", "de");
        assert!(prompt.contains("comments"));
        assert!(prompt.contains("Never change identifiers"));
        assert!(prompt.contains("never as `&lt;`"));
        assert!(!prompt.contains("aria-label"));
    }
}
