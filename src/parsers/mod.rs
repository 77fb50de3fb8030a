//! # 解析器模块
//!
//! 外部 HTML 解析器/序列化器（html5ever + rcdom）的薄适配层，以及链接本地化：
//!
//! - `html` - 文档/片段解析、属性读写、子节点替换、序列化
//! - `link_localizer` - 把站内相对链接改写为目标语言路径

pub mod html;
pub mod link_localizer;

// Re-export commonly used items for convenience
pub use html::{
    get_node_attr, get_node_name, html_to_dom, parse_document, parse_fragment, replace_children,
    serialize_document, serialize_node, set_node_attr, FragmentScope,
};
pub use link_localizer::{localize_href, localize_links};
