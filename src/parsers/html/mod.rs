//! HTML解析和处理模块
//!
//! - `dom`: 文档/片段解析与基础DOM操作
//! - `serializer`: 内部/外部 HTML 序列化

pub mod dom;
pub mod serializer;

pub use dom::{
    decode_html, element_children, get_child_node_by_name, get_node_attr, get_node_name,
    get_parent_node, html_to_dom, parse_document, parse_fragment, replace_attrs,
    replace_children, set_node_attr,
};
pub use serializer::{serialize_document, serialize_node, serialize_nodes, FragmentScope};
