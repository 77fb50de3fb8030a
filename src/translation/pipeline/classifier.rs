//! 翻译单元分类器
//!
//! 按文档顺序深度优先遍历 DOM，选出翻译单元：
//!
//! - 带有可翻译属性的元素整体成为一个单元（outer HTML），不再分解
//! - 跳过类元素（script、style 等）连同子树一起忽略
//! - 语义块元素（p、li、td、code 等）只要子树里有非空白文本即成为单元（inner HTML）
//! - 容器元素（div、span 等）只有直接的非空白文本子节点时才成为单元，否则继续下钻
//! - 其他元素始终下钻

use markup5ever_rcdom::{Handle, NodeData};

use super::attributes::{default_allow_list, AttributeAllowList};
use crate::parsers::html::{get_node_name, get_parent_node, serialize_node, FragmentScope};
use crate::translation::config::constants;
use crate::translation::error::TranslationResult;
use crate::translation::storage::cache::fingerprint;

/// 标签分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagClass {
    /// 连同子树一起跳过
    Skip,
    /// 子树有文本即成为单元
    Semantic,
    /// 有直接文本子节点才成为单元
    Container,
    /// 始终下钻
    Other,
}

/// 按标签名（大小写敏感）分类
pub fn classify_tag(tag: &str) -> TagClass {
    if constants::SKIP_TAGS.contains(&tag) {
        TagClass::Skip
    } else if constants::SEMANTIC_TAGS.contains(&tag) {
        TagClass::Semantic
    } else if constants::CONTAINER_TAGS.contains(&tag) {
        TagClass::Container
    } else {
        TagClass::Other
    }
}

/// 单元种类
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitKind {
    /// 文本块：翻译子节点
    Block,
    /// 携带可翻译属性：翻译整个元素（属性 + 子节点）
    Attributes(Vec<String>),
}

/// 翻译单元
#[derive(Debug, Clone)]
pub struct TranslationUnit {
    /// DOM节点引用
    pub node: Handle,
    /// 单元种类
    pub kind: UnitKind,
    /// 源片段（缓存键与校验基线）
    pub source: String,
    /// 是否按代码块处理
    pub is_code: bool,
}

impl TranslationUnit {
    fn new(node: &Handle, kind: UnitKind) -> TranslationResult<Self> {
        let scope = match kind {
            UnitKind::Block => FragmentScope::Inner,
            UnitKind::Attributes(_) => FragmentScope::Outer,
        };
        let source = serialize_node(node, scope)?;
        let is_code = matches!(get_node_name(node), Some("code") | Some("pre"));

        Ok(Self {
            node: node.clone(),
            kind,
            source,
            is_code,
        })
    }

    /// 片段范围，决定合并回树时的语义
    pub fn scope(&self) -> FragmentScope {
        match self.kind {
            UnitKind::Block => FragmentScope::Inner,
            UnitKind::Attributes(_) => FragmentScope::Outer,
        }
    }

    pub fn tag_name(&self) -> &str {
        get_node_name(&self.node).unwrap_or_default()
    }

    /// 解析本单元片段（原文与译文）时使用的上下文元素
    ///
    /// inner 片段在节点自身中解析；outer 片段在父节点中解析，父节点缺失
    /// 或是 `html` 时退回 `body`。
    pub fn parse_context(&self) -> String {
        match self.scope() {
            FragmentScope::Inner => self.tag_name().to_string(),
            FragmentScope::Outer => get_parent_node(&self.node)
                .and_then(|parent| get_node_name(&parent).map(str::to_string))
                .filter(|name| name != "html")
                .unwrap_or_else(|| "body".to_string()),
        }
    }

    pub fn fingerprint(&self) -> String {
        fingerprint(&self.source)
    }
}

/// 树分类器
pub struct TreeClassifier<'a> {
    allow_list: &'a AttributeAllowList,
}

impl Default for TreeClassifier<'static> {
    fn default() -> Self {
        Self::new(default_allow_list())
    }
}

impl<'a> TreeClassifier<'a> {
    pub fn new(allow_list: &'a AttributeAllowList) -> Self {
        Self { allow_list }
    }

    /// 按文档顺序返回翻译单元
    pub fn classify(&self, root: &Handle) -> TranslationResult<Vec<TranslationUnit>> {
        let mut units = Vec::new();
        self.visit(root, &mut units)?;
        Ok(units)
    }

    fn visit(&self, node: &Handle, units: &mut Vec<TranslationUnit>) -> TranslationResult<()> {
        match node.data {
            NodeData::Element { ref name, .. } => {
                let attrs = self.allow_list.translatable_attrs(node);
                if !attrs.is_empty() {
                    units.push(TranslationUnit::new(node, UnitKind::Attributes(attrs))?);
                    return Ok(());
                }

                match classify_tag(&name.local) {
                    TagClass::Skip => return Ok(()),
                    TagClass::Semantic if has_descendant_text(node) => {
                        units.push(TranslationUnit::new(node, UnitKind::Block)?);
                        return Ok(());
                    }
                    TagClass::Container if has_direct_text(node) => {
                        units.push(TranslationUnit::new(node, UnitKind::Block)?);
                        return Ok(());
                    }
                    _ => {}
                }

                for child in node.children.borrow().iter() {
                    self.visit(child, units)?;
                }
            }
            NodeData::Document => {
                for child in node.children.borrow().iter() {
                    self.visit(child, units)?;
                }
            }
            _ => {}
        }

        Ok(())
    }
}

/// 使用默认白名单分类
pub fn classify(root: &Handle) -> TranslationResult<Vec<TranslationUnit>> {
    TreeClassifier::default().classify(root)
}

fn is_blank_text(node: &Handle) -> Option<bool> {
    match node.data {
        NodeData::Text { ref contents } => Some(contents.borrow().trim().is_empty()),
        _ => None,
    }
}

fn has_direct_text(node: &Handle) -> bool {
    node.children
        .borrow()
        .iter()
        .any(|child| is_blank_text(child) == Some(false))
}

/// 子树中是否有非空白文本（跳过类元素的子树不计）
fn has_descendant_text(node: &Handle) -> bool {
    node.children.borrow().iter().any(|child| match child.data {
        NodeData::Text { .. } => is_blank_text(child) == Some(false),
        NodeData::Element { ref name, .. } => {
            classify_tag(&name.local) != TagClass::Skip && has_descendant_text(child)
        }
        _ => false,
    })
}
