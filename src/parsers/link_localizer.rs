//! 链接本地化模块
//!
//! 把译文页面中的站内相对链接改写到目标语言路径下，例如页面
//! `blog/post.html` 中的 `../d/e.html` 在 `fr` 版本里变成 `/fr/d/e.html`。

use markup5ever_rcdom::{Handle, NodeData};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::parsers::html::{get_node_attr, set_node_attr};

static SCHEME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*:").expect("scheme regex"));

const SYNTHETIC_ORIGIN: &str = "http://localhost/";

/// 类似锚点、带 `href` 的元素
const ANCHOR_TAGS: &[&str] = &["a", "area"];

/// 就地改写 DOM 中所有站内链接
///
/// `page_path` 是当前页面相对站点根目录的路径，如 `blog/post.html`。
pub fn localize_links(root: &Handle, lang: &str, page_path: &str) {
    let Some(base) = page_base(page_path) else {
        tracing::warn!("无法为页面构造基础URL，跳过链接本地化: {}", page_path);
        return;
    };
    walk_and_localize(root, lang, &base);
}

/// 递归遍历DOM树并改写链接
fn walk_and_localize(node: &Handle, lang: &str, base: &Url) {
    match node.data {
        NodeData::Document => {}
        NodeData::Element { ref name, .. } => {
            if ANCHOR_TAGS.contains(&name.local.as_ref()) {
                if let Some(href) = get_node_attr(node, "href") {
                    if let Some(localized) = localize_against(&href, lang, base) {
                        set_node_attr(node, "href", Some(localized));
                    }
                }
            }
        }
        _ => return,
    }

    for child in node.children.borrow().iter() {
        walk_and_localize(child, lang, base);
    }
}

fn page_base(page_path: &str) -> Option<Url> {
    let normalized = page_path.replace('\\', "/");
    let origin = Url::parse(SYNTHETIC_ORIGIN).ok()?;
    origin.join(normalized.trim_start_matches('/')).ok()
}

/// 改写单个链接，不需要改写时返回 `None`
pub fn localize_href(href: &str, lang: &str, page_path: &str) -> Option<String> {
    localize_against(href, lang, &page_base(page_path)?)
}

fn should_skip(href: &str) -> bool {
    href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("//")
        || SCHEME_RE.is_match(href)
}

fn localize_against(href: &str, lang: &str, base: &Url) -> Option<String> {
    let href = href.trim();
    if should_skip(href) {
        return None;
    }

    let resolved = base.join(href).ok()?;
    let path = resolved.path();

    let last_segment = path.rsplit('/').next().unwrap_or_default();
    let extension = last_segment
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or_default();
    if !extension.is_empty() && !extension.eq_ignore_ascii_case("html") {
        return None;
    }

    // 已经在语言目录下的链接保持原样
    let lang_prefix = format!("/{}", lang);
    if path == lang_prefix || path.starts_with(&format!("{}/", lang_prefix)) {
        return None;
    }

    let mut localized = format!("{}{}", lang_prefix, path);
    if let Some(query) = resolved.query() {
        localized.push('?');
        localized.push_str(query);
    }
    if let Some(fragment) = resolved.fragment() {
        localized.push('#');
        localized.push_str(fragment);
    }

    Some(localized)
}
