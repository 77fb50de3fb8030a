//! 可翻译属性白名单
//!
//! 白名单条目有三种写法：
//!
//! - `alt`：任意元素上的同名属性
//! - `input[type=button]:value`：仅当元素为 `input` 且 `type=button` 时的 `value`
//! - `meta[description]`：`name` 或 `property` 为 `description` 的 `meta` 的 `content`

use html5ever::interface::Attribute;
use markup5ever_rcdom::{Handle, NodeData};
use once_cell::sync::Lazy;

use crate::translation::config::constants;

static DEFAULT_ALLOW_LIST: Lazy<AttributeAllowList> =
    Lazy::new(|| AttributeAllowList::from_entries(constants::TRANSLATABLE_ATTRS));

/// 默认白名单
pub fn default_allow_list() -> &'static AttributeAllowList {
    &DEFAULT_ALLOW_LIST
}

/// 单条白名单规则
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrRule {
    Plain(String),
    Qualified {
        tag: String,
        key: String,
        value: String,
        attr: String,
    },
    Meta {
        key: String,
    },
}

impl AttrRule {
    /// 解析一条白名单条目，格式不合法时返回 `None`
    pub fn parse(entry: &str) -> Option<Self> {
        let entry = entry.trim();
        if entry.is_empty() {
            return None;
        }

        let Some(open) = entry.find('[') else {
            return Some(AttrRule::Plain(entry.to_string()));
        };
        let close = open + entry[open..].find(']')?;
        let tag = &entry[..open];
        let selector = &entry[open + 1..close];
        let rest = &entry[close + 1..];

        if let Some(attr) = rest.strip_prefix(':') {
            let (key, value) = selector.split_once('=')?;
            return Some(AttrRule::Qualified {
                tag: tag.to_string(),
                key: key.trim().to_string(),
                value: value.trim().trim_matches('"').to_string(),
                attr: attr.to_string(),
            });
        }

        if tag == "meta" && rest.is_empty() {
            return Some(AttrRule::Meta {
                key: selector.trim().to_string(),
            });
        }

        None
    }

    /// 判断 `tag` 元素上的 `attr_name` 是否命中此规则
    pub fn matches(&self, tag: &str, attrs: &[Attribute], attr_name: &str) -> bool {
        match self {
            AttrRule::Plain(name) => name == attr_name,
            AttrRule::Qualified {
                tag: rule_tag,
                key,
                value,
                attr,
            } => {
                rule_tag == tag
                    && attr == attr_name
                    && attr_value(attrs, key).map_or(false, |v| v.eq_ignore_ascii_case(value))
            }
            AttrRule::Meta { key } => {
                tag == "meta"
                    && attr_name == "content"
                    && (attr_value(attrs, "name") == Some(key.as_str())
                        || attr_value(attrs, "property") == Some(key.as_str()))
            }
        }
    }
}

fn attr_value<'a>(attrs: &'a [Attribute], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|attr| &*attr.name.local == name)
        .map(|attr| &*attr.value)
}

/// 解析后的白名单
#[derive(Debug, Clone, Default)]
pub struct AttributeAllowList {
    rules: Vec<AttrRule>,
}

impl AttributeAllowList {
    pub fn from_entries(entries: &[&str]) -> Self {
        let rules = entries
            .iter()
            .filter_map(|entry| {
                let rule = AttrRule::parse(entry);
                if rule.is_none() {
                    tracing::warn!("忽略无效的属性白名单条目: {}", entry);
                }
                rule
            })
            .collect();

        Self { rules }
    }

    pub fn is_translatable(&self, tag: &str, attrs: &[Attribute], attr_name: &str) -> bool {
        self.rules
            .iter()
            .any(|rule| rule.matches(tag, attrs, attr_name))
    }

    /// 返回节点上值非空且命中白名单的属性名
    pub fn translatable_attrs(&self, node: &Handle) -> Vec<String> {
        let NodeData::Element {
            ref name,
            ref attrs,
            ..
        } = node.data
        else {
            return Vec::new();
        };

        let attrs = attrs.borrow();
        attrs
            .iter()
            .filter(|attr| !attr.value.trim().is_empty())
            .filter(|attr| self.is_translatable(&name.local, &attrs, &attr.name.local))
            .map(|attr| attr.name.local.to_string())
            .collect()
    }
}
