// 集成测试公共模块
//
// 提供模拟模型、测试配置和示例页面

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use html_translate::translation::pipeline::decode_payload;
use html_translate::translation::{
    ChatModel, ChatRequest, TranslationConfig, TranslationError, TranslationResult,
};

// ============================================================================
// 模拟模型
// ============================================================================

/// 把标签之外的文本转成大写的"翻译"
pub fn shout(fragment: &str) -> String {
    let mut in_tag = false;
    fragment
        .chars()
        .map(|c| match c {
            '<' => {
                in_tag = true;
                c
            }
            '>' => {
                in_tag = false;
                c
            }
            _ if in_tag => c,
            _ => c.to_ascii_uppercase(),
        })
        .collect()
}

/// 按 chunk 协议回应的模拟模型
///
/// 每个 chunk 的译文由 [`shout`] 生成。系统提示词包含 `fail_for` 时返回 HTTP 500。
#[derive(Clone, Default)]
pub struct MockModel {
    calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
    fail_for: Option<String>,
    delay: Option<Duration>,
}

impl MockModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// 系统提示词包含 `marker`（如语言显示名）时失败
    pub fn failing_for(marker: &str) -> Self {
        Self {
            fail_for: Some(marker.to_string()),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl ChatModel for MockModel {
    async fn complete(&self, request: &ChatRequest) -> TranslationResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let system = request.system_prompt().unwrap_or_default().to_string();
        self.prompts.lock().unwrap().push(system.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(marker) = &self.fail_for {
            if system.contains(marker.as_str()) {
                return Err(TranslationError::HttpStatus {
                    status: 500,
                    body: "upstream exploded".to_string(),
                });
            }
        }

        let user = request.user_content().unwrap_or_default();
        let response = decode_payload(user)
            .into_iter()
            .map(|(index, body)| format!("<chunk id=\"{}\">{}</chunk>", index, shout(&body)))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(format!("Here you go:\n{}\n", response))
    }
}

/// 依次回放预设响应的模型，响应用完后返回网络错误
#[derive(Clone, Default)]
pub struct ScriptedModel {
    responses: Arc<Mutex<VecDeque<TranslationResult<String>>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedModel {
    pub fn new(responses: Vec<TranslationResult<String>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ChatModel for ScriptedModel {
    async fn complete(&self, _request: &ChatRequest) -> TranslationResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TranslationError::NetworkError("script exhausted".to_string())))
    }
}

/// 把若干片段包成一个 chunk 响应
pub fn chunk_response(fragments: &[&str]) -> TranslationResult<String> {
    Ok(fragments
        .iter()
        .enumerate()
        .map(|(index, fragment)| format!("<chunk id=\"{}\">{}</chunk>", index, fragment))
        .collect::<Vec<_>>()
        .join("\n"))
}

// ============================================================================
// 配置与页面
// ============================================================================

/// 测试配置：en → fr, ja，立即重试，缓存写到 `dir`
pub fn test_config(dir: &Path) -> TranslationConfig {
    TranslationConfig {
        retry_delay_ms: 0,
        max_retries: 1,
        cache_path: dir.join("fragments.json").to_string_lossy().into_owned(),
        ..TranslationConfig::with_langs("en", &["fr", "ja"])
    }
}

/// HTML测试辅助工具
pub struct HtmlTestHelper;

impl HtmlTestHelper {
    pub fn blog_post() -> String {
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="description" content="A short post">
<title>Post</title>
<script>var greeting = "hello";</script>
</head>
<body>
<h1 id="top">Welcome to the blog</h1>
<p>Read the <a href="../../d/e.html">docs</a> or jump to <a href="#top">the top</a>.</p>
<p><img src="cat.png" alt="A cat"></p>
<ul>
<li>First item here</li>
<li>Second item <a href="mailto:a@b.com">mail us</a></li>
</ul>
<pre><code>// add two numbers
let x = 1 + 2;</code></pre>
<footer>Made with care <a href="//cdn.example.com/x.js">cdn</a> <a href="style.css">css</a></footer>
</body>
</html>"##
            .to_string()
    }

    pub fn empty_page() -> String {
        "<!DOCTYPE html><html><head><script>track()</script></head><body><div>\n  </div><img src=\"x.png\"></body></html>".to_string()
    }
}
