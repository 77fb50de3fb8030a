//! 属性还原
//!
//! 源片段与译文按文档顺序逐个元素对齐。对齐成功时，每个译文元素的属性
//! 以源元素属性为底，只用译文中出现的白名单属性覆盖；无法对齐时原样
//! 返回译文，交给校验器判定。

use html5ever::interface::Attribute;
use markup5ever_rcdom::NodeData;

use crate::parsers::html::{
    element_children, get_node_name, parse_fragment, replace_attrs, serialize_nodes,
};
use crate::translation::pipeline::attributes::{default_allow_list, AttributeAllowList};

use super::structure::DEFAULT_CONTEXT;

/// 使用默认白名单还原属性（模板上下文）
pub fn restore_attributes(source: &str, translated: &str) -> String {
    restore_attributes_in(DEFAULT_CONTEXT, source, translated)
}

/// 在指定上下文元素中解析片段并还原属性
pub fn restore_attributes_in(context: &str, source: &str, translated: &str) -> String {
    restore_attributes_with(default_allow_list(), context, source, translated)
}

/// 使用指定白名单还原属性
pub fn restore_attributes_with(
    allow_list: &AttributeAllowList,
    context: &str,
    source: &str,
    translated: &str,
) -> String {
    let source_nodes = parse_fragment(source, context);
    let translated_nodes = parse_fragment(translated, context);

    let source_elements = element_children(&source_nodes);
    let translated_elements = element_children(&translated_nodes);

    if source_elements.len() != translated_elements.len() {
        return translated.to_string();
    }
    let aligned = source_elements
        .iter()
        .zip(&translated_elements)
        .all(|(s, t)| get_node_name(s) == get_node_name(t));
    if !aligned {
        return translated.to_string();
    }

    for (source_el, translated_el) in source_elements.iter().zip(&translated_elements) {
        let (
            NodeData::Element {
                name,
                attrs: source_attrs,
                ..
            },
            NodeData::Element {
                attrs: translated_attrs,
                ..
            },
        ) = (&source_el.data, &translated_el.data)
        else {
            continue;
        };

        let source_attrs = source_attrs.borrow();
        let mut merged: Vec<Attribute> = source_attrs.clone();
        {
            let translated_attrs = translated_attrs.borrow();
            for attr in merged.iter_mut() {
                if !allow_list.is_translatable(&name.local, &source_attrs, &attr.name.local) {
                    continue;
                }
                if let Some(new) = translated_attrs
                    .iter()
                    .find(|candidate| candidate.name.local == attr.name.local)
                {
                    attr.value = new.value.clone();
                }
            }
            // 源元素没有、译文新增的白名单属性也保留
            for attr in translated_attrs.iter() {
                let present = merged.iter().any(|m| m.name.local == attr.name.local);
                if !present && allow_list.is_translatable(&name.local, &source_attrs, &attr.name.local)
                {
                    merged.push(attr.clone());
                }
            }
        }
        drop(source_attrs);

        replace_attrs(translated_el, merged);
    }

    match serialize_nodes(&translated_nodes) {
        Ok(html) => html,
        Err(e) => {
            tracing::debug!("属性还原序列化失败，保留译文: {}", e);
            translated.to_string()
        }
    }
}
