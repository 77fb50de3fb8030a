use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use markup5ever_rcdom::{Handle, RcDom, SerializableHandle};

use crate::translation::error::{TranslationError, TranslationResult};

/// 片段范围：只含子节点，或连同节点本身
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentScope {
    /// 子节点序列（inner HTML）
    Inner,
    /// 节点本身（outer HTML）
    Outer,
}

/// 序列化文档
pub fn serialize_document(dom: &RcDom) -> TranslationResult<String> {
    serialize_with(&dom.document, TraversalScope::ChildrenOnly(None))
}

/// 序列化单个节点的内部或外部 HTML
///
/// 空元素（`img`、`br` 等）按 HTML 语法输出，不带自闭合斜杠。
pub fn serialize_node(node: &Handle, scope: FragmentScope) -> TranslationResult<String> {
    let traversal_scope = match scope {
        FragmentScope::Inner => TraversalScope::ChildrenOnly(None),
        FragmentScope::Outer => TraversalScope::IncludeNode,
    };
    serialize_with(node, traversal_scope)
}

/// 序列化一组顶层节点（片段解析结果）
pub fn serialize_nodes(nodes: &[Handle]) -> TranslationResult<String> {
    let mut out = String::new();
    for node in nodes {
        out.push_str(&serialize_with(node, TraversalScope::IncludeNode)?);
    }
    Ok(out)
}

fn serialize_with(node: &Handle, traversal_scope: TraversalScope) -> TranslationResult<String> {
    let mut buf: Vec<u8> = Vec::new();
    let serializable: SerializableHandle = node.clone().into();
    let opts = SerializeOpts {
        traversal_scope,
        ..Default::default()
    };

    serialize(&mut buf, &serializable, opts)
        .map_err(|e| TranslationError::ParseError(format!("序列化DOM失败: {}", e)))?;

    Ok(String::from_utf8_lossy(&buf).into_owned())
}
