use std::rc::Rc;

use encoding_rs::Encoding;
use html5ever::interface::{Attribute, QualName};
use html5ever::tendril::{format_tendril, TendrilSink};
use html5ever::{namespace_url, ns, parse_document as parse_html_document, LocalName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// 按字节序标记或给定的字符集标签解码页面字节
///
/// 有 BOM 时以 BOM 为准；标签无法识别时按 UTF-8 有损解码。
pub fn decode_html(data: &[u8], document_encoding: &str) -> String {
    if let Some((encoding, bom_len)) = Encoding::for_bom(data) {
        return encoding.decode_without_bom_handling(&data[bom_len..]).0.into_owned();
    }

    match Encoding::for_label(document_encoding.as_bytes()) {
        Some(encoding) => encoding.decode(data).0.into_owned(),
        None => String::from_utf8_lossy(data).into_owned(),
    }
}

/// 将 HTML 字节转换为 DOM
pub fn html_to_dom(data: &[u8], document_encoding: &str) -> RcDom {
    parse_document(&decode_html(data, document_encoding))
}

/// 解析完整文档
pub fn parse_document(html: &str) -> RcDom {
    parse_html_document(RcDom::default(), Default::default()).one(html)
}

/// 在给定上下文元素中解析 HTML 片段
///
/// 返回片段的顶层节点，这些节点已从临时文档中摘下（父引用被清空），
/// 可以直接挂到另一棵树上。
///
/// 上下文决定解析器的插入模式：`td` 片段需要 `tr` 上下文才能保留。
/// `template` 上下文由第一个开始标签选定模式，此后不属于该模式的元素
/// 仍会被丢弃，因此只作为缺少父元素时的兜底。
pub fn parse_fragment(html: &str, context: &str) -> Vec<Handle> {
    let context_name = QualName::new(None, ns!(html), LocalName::from(context));
    let dom = html5ever::parse_fragment(RcDom::default(), Default::default(), context_name, vec![])
        .one(html);

    let root = dom.document.children.borrow().first().cloned();
    match root {
        Some(root) => {
            let nodes = std::mem::take(&mut *root.children.borrow_mut());
            for node in &nodes {
                node.parent.set(None);
            }
            nodes
        }
        None => Vec::new(),
    }
}

/// 根据名称获取子节点
pub fn get_child_node_by_name(parent: &Handle, node_name: &str) -> Option<Handle> {
    let children = parent.children.borrow();
    let matching_children = children.iter().find(|child| match child.data {
        NodeData::Element { ref name, .. } => &*name.local == node_name,
        _ => false,
    });
    matching_children.cloned()
}

/// 按文档顺序展平所有元素节点（含 `nodes` 本身）
pub fn element_children(nodes: &[Handle]) -> Vec<Handle> {
    fn walk(node: &Handle, out: &mut Vec<Handle>) {
        if let NodeData::Element { .. } = node.data {
            out.push(node.clone());
        }
        for child in node.children.borrow().iter() {
            walk(child, out);
        }
    }

    let mut out = Vec::new();
    for node in nodes {
        walk(node, &mut out);
    }
    out
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| &*attr.name.local == attr_name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

/// 获取节点名称
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// 获取父节点
pub fn get_parent_node(child: &Handle) -> Option<Handle> {
    let weak = child.parent.take();
    let parent = weak.as_ref().and_then(|node| node.upgrade());
    child.parent.set(weak);
    parent
}

/// 设置节点属性
pub fn set_node_attr(node: &Handle, attr_name: &str, attr_value: Option<String>) {
    if let NodeData::Element { attrs, .. } = &node.data {
        let attrs_mut = &mut attrs.borrow_mut();
        let mut i = 0;
        let mut found_existing_attr: bool = false;

        while i < attrs_mut.len() {
            if &attrs_mut[i].name.local == attr_name {
                found_existing_attr = true;

                if let Some(attr_value) = attr_value.as_deref() {
                    attrs_mut[i].value.clear();
                    attrs_mut[i].value.push_slice(attr_value);
                } else {
                    // Remove attr completely if attr_value is not defined
                    attrs_mut.remove(i);
                    continue;
                }
            }

            i += 1;
        }

        if !found_existing_attr {
            if let Some(attr_value) = attr_value {
                attrs_mut.push(Attribute {
                    name: QualName::new(None, ns!(), LocalName::from(attr_name)),
                    value: format_tendril!("{}", attr_value),
                });
            }
        }
    };
}

/// 整体替换元素的属性列表
pub fn replace_attrs(node: &Handle, new_attrs: Vec<Attribute>) {
    if let NodeData::Element { attrs, .. } = &node.data {
        *attrs.borrow_mut() = new_attrs;
    }
}

/// 替换子节点并重建父引用
///
/// 父引用是非拥有的弱引用，只用于导航；旧子节点的父引用被清空。
pub fn replace_children(node: &Handle, new_children: Vec<Handle>) {
    for child in &new_children {
        child.parent.set(Some(Rc::downgrade(node)));
    }
    let old_children = node.children.replace(new_children);
    for child in &old_children {
        child.parent.set(None);
    }
}
