//! 请求载荷编解码
//!
//! 一个 chunk 内的所有片段用带索引的分隔标签包起来，合成一个用户消息：
//!
//! ```text
//! <chunk id="0">Hello</chunk>
//! <chunk id="1">See <a href="/docs">the docs</a></chunk>
//! ```
//!
//! 解码时在响应里找出所有 `<chunk id="N">…</chunk>`，与顺序无关，
//! 也容忍模型在前后附加的说明文字。
//!
//! 代码块以原样形式发送：标签照旧，文本中的 `&lt;` 等实体还原成字符，
//! 模型看到的是真正的代码。回复再按源片段里出现过的标签名重新转义。

use std::collections::{BTreeMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

static CHUNK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<chunk\s+id\s*=\s*["']?(\d+)["']?\s*>(.*?)</chunk\s*>"#)
        .expect("chunk regex")
});

static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"</?([a-zA-Z][a-zA-Z0-9-]*)(?:[^>"']|"[^"]*"|'[^']*')*>"#).expect("tag regex")
});

static ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(amp|lt|gt|nbsp);").expect("entity regex"));

/// 编码一组片段；索引即片段在切片中的位置
///
/// 空白片段不写入载荷，调用方需将其视为解码结果中不存在。
pub fn encode_payload<S: AsRef<str>>(fragments: &[S]) -> String {
    fragments
        .iter()
        .enumerate()
        .filter(|(_, fragment)| !fragment.as_ref().trim().is_empty())
        .map(|(index, fragment)| format!("<chunk id=\"{}\">{}</chunk>", index, fragment.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 解码响应为 `索引 → 译文`，译文去掉首尾空白
///
/// 同一索引出现多次时保留第一次。缺失或多余的索引不在这里报错。
pub fn decode_payload(response: &str) -> BTreeMap<usize, String> {
    let mut decoded = BTreeMap::new();

    for captures in CHUNK_RE.captures_iter(response) {
        let Some(index) = captures.get(1).and_then(|m| m.as_str().parse::<usize>().ok()) else {
            continue;
        };
        let body = captures.get(2).map_or("", |m| m.as_str()).trim();
        decoded.entry(index).or_insert_with(|| body.to_string());
    }

    decoded
}

/// 对标签之间的文本段逐段变换，标签本身由 `keep_tag` 决定是否原样保留
fn map_text<F>(fragment: &str, keep_tag: impl Fn(&str) -> bool, mut text: F) -> String
where
    F: FnMut(&str, &mut String),
{
    let mut out = String::with_capacity(fragment.len());
    let mut last = 0;

    for captures in TAG_RE.captures_iter(fragment) {
        let (Some(tag), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        if !keep_tag(name.as_str()) {
            continue;
        }
        text(&fragment[last..tag.start()], &mut out);
        out.push_str(tag.as_str());
        last = tag.end();
    }
    text(&fragment[last..], &mut out);

    out
}

/// 代码片段的原样形式：标签保留，文本里的实体还原成字符
///
/// 输入是序列化器的输出，文本中只会出现 `&amp;` `&lt;` `&gt;` `&nbsp;`。
pub fn raw_code_text(fragment: &str) -> String {
    map_text(
        fragment,
        |_| true,
        |text, out| {
            let decoded = ENTITY_RE.replace_all(text, |caps: &regex::Captures| match &caps[1] {
                "amp" => "&",
                "lt" => "<",
                "gt" => ">",
                _ => "\u{a0}",
            });
            out.push_str(&decoded);
        },
    )
}

/// 把原样代码回复转回 HTML 片段
///
/// 只有源片段里出现过的标签名被当作标签，其余 `<...>` 都是代码文本，
/// 与序列化器一样转义。
pub fn escape_code_reply(reply: &str, source: &str) -> String {
    let known: HashSet<String> = TAG_RE
        .captures_iter(source)
        .filter_map(|caps| caps.get(1).map(|name| name.as_str().to_ascii_lowercase()))
        .collect();

    map_text(
        reply,
        |name| known.contains(&name.to_ascii_lowercase()),
        |text, out| {
            for c in text.chars() {
                match c {
                    '&' => out.push_str("&amp;"),
                    '<' => out.push_str("&lt;"),
                    '>' => out.push_str("&gt;"),
                    '\u{a0}' => out.push_str("&nbsp;"),
                    _ => out.push(c),
                }
            }
        },
    )
}
