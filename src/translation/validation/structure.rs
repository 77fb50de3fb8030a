//! 结构一致性校验
//!
//! 源片段与译文在同一个上下文元素中解析（与合并回树时的解析方式一致），
//! 比较两件事：
//!
//! 1. 各标签名的出现次数（译文里多出源片段没有的标签即为幻觉）
//! 2. `href`/`src`/`class`/`id` 的 (标签, 属性, 值) 三元组多重集合

use std::collections::BTreeMap;

use markup5ever_rcdom::{Handle, NodeData};

use super::ratio::check_ratio;
use super::ValidationResult;
use crate::parsers::html::{element_children, parse_fragment};
use crate::translation::config::constants;

/// 不知道单元位置时使用的上下文
pub const DEFAULT_CONTEXT: &str = "template";

type TagCounts = BTreeMap<String, usize>;
type AttrTriples = BTreeMap<(String, String, String), usize>;

fn collect(nodes: &[Handle]) -> (TagCounts, AttrTriples) {
    let mut tags = TagCounts::new();
    let mut triples = AttrTriples::new();

    for element in element_children(nodes) {
        let NodeData::Element {
            ref name,
            ref attrs,
            ..
        } = element.data
        else {
            continue;
        };

        *tags.entry(name.local.to_string()).or_default() += 1;

        for attr in attrs.borrow().iter() {
            if constants::STRUCTURAL_ATTRS.contains(&&*attr.name.local) {
                let key = (
                    name.local.to_string(),
                    attr.name.local.to_string(),
                    attr.value.to_string(),
                );
                *triples.entry(key).or_default() += 1;
            }
        }
    }

    (tags, triples)
}

/// 只做结构比较，不含空译文和长度比检查
///
/// `context` 是解析片段用的上下文元素名；在该上下文中被解析器丢弃的
/// 元素两边都看不到，合并回树时同样会被丢弃。
pub fn check_structure(context: &str, source: &str, target: &str) -> ValidationResult {
    let (source_tags, source_attrs) = collect(&parse_fragment(source, context));
    let (target_tags, target_attrs) = collect(&parse_fragment(target, context));

    if let Some(tag) = target_tags.keys().find(|tag| !source_tags.contains_key(*tag)) {
        return ValidationResult::invalid(format!("hallucinated tag <{}>", tag));
    }

    for (tag, expected) in &source_tags {
        let actual = target_tags.get(tag).copied().unwrap_or(0);
        if actual != *expected {
            return ValidationResult::invalid(format!(
                "tag mismatch: <{}> expected {}, found {}",
                tag, expected, actual
            ));
        }
    }

    if let Some((tag, attr, value)) = target_attrs.keys().find(|key| !source_attrs.contains_key(*key))
    {
        return ValidationResult::invalid(format!(
            "hallucinated attribute <{} {}=\"{}\">",
            tag, attr, value
        ));
    }

    for ((tag, attr, value), expected) in &source_attrs {
        let key = (tag.clone(), attr.clone(), value.clone());
        let actual = target_attrs.get(&key).copied().unwrap_or(0);
        if actual != *expected {
            return ValidationResult::invalid(format!(
                "attribute mismatch: <{} {}=\"{}\"> expected {}, found {}",
                tag, attr, value, expected, actual
            ));
        }
    }

    ValidationResult::ok()
}

/// 片段校验：空译文、长度比、结构一致性（模板上下文）
pub fn validate_fragment(source: &str, target: &str) -> ValidationResult {
    validate_fragment_in(DEFAULT_CONTEXT, source, target)
}

/// 在指定上下文元素中做片段校验
pub fn validate_fragment_in(context: &str, source: &str, target: &str) -> ValidationResult {
    if target.trim().is_empty() && !source.trim().is_empty() {
        return ValidationResult::invalid("translation is empty").with_fragments(source, target);
    }

    let ratio = check_ratio(source, target);
    if !ratio.valid {
        return ratio.with_fragments(source, target);
    }

    let mut result = check_structure(context, source, target);
    result.ratio = ratio.ratio;
    result.with_fragments(source, target)
}
