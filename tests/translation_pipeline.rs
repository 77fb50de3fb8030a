// 翻译管道端到端测试
//
// 用模拟模型驱动 PageTranslator，覆盖分类、批次、校验、合并、链接本地化和缓存

use std::sync::Arc;
use std::time::Duration;

use html_translate::translation::{FragmentCache, PageTranslator, RenderedPage, TranslationConfig};
use tempfile::TempDir;

mod common;
use common::{chunk_response, test_config, HtmlTestHelper, MockModel, ScriptedModel};

fn translator(
    config: TranslationConfig,
    model: &MockModel,
    cache: &Arc<FragmentCache>,
) -> PageTranslator<MockModel> {
    PageTranslator::new(config, model.clone(), Arc::clone(cache)).unwrap()
}

#[tokio::test]
async fn test_page_is_translated_into_every_language() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let cache = Arc::new(FragmentCache::new(config.cache_file()));
    let model = MockModel::new();
    let translator = translator(config, &model, &cache);

    let page = RenderedPage::new("blog/post.html", HtmlTestHelper::blog_post());
    let records = translator.translate_page(&page).await.unwrap();

    let langs: Vec<_> = records.iter().map(|r| r.lang.as_str()).collect();
    assert_eq!(langs, vec!["fr", "ja"]);

    let fr = &records[0];
    assert_eq!(fr.path.pathname, "/fr/blog/post.html");
    assert_eq!(fr.path.dirname, "/fr/blog");
    assert_eq!(fr.path.filename, "post.html");

    let html = &fr.html;
    assert!(html.contains("<html lang=\"fr\">"));
    assert!(html.contains("<h1 id=\"top\">WELCOME TO THE BLOG</h1>"));
    assert!(html.contains("READ THE <a href=\"/fr/d/e.html\">DOCS</a>"));
    assert!(html.contains("<a href=\"#top\">THE TOP</a>"));
    assert!(html.contains("<li>FIRST ITEM HERE</li>"));
    assert!(html.contains("<a href=\"mailto:a@b.com\">MAIL US</a>"));
    assert!(html.contains("LET X = 1 + 2;"));
    assert!(html.contains("<a href=\"//cdn.example.com/x.js\">CDN</a>"));
    assert!(html.contains("<a href=\"style.css\">CSS</a>"));
    // 跳过的元素保持原样
    assert!(html.contains("var greeting = \"hello\";"));
    assert!(html.contains("<title>Post</title>"));

    assert!(records[1].html.contains("<html lang=\"ja\">"));
    assert!(records[1].html.contains("/ja/d/e.html"));

    let stats = translator.stats();
    assert_eq!(stats.pages_processed, 1);
    assert_eq!(stats.pages_generated, 2);
    assert_eq!(stats.passes_skipped, 0);
    assert_eq!(stats.units_total, 16);
    assert_eq!(stats.cache_hits, 0);
}

#[tokio::test]
async fn test_text_and_code_use_separate_prompts() {
    let dir = TempDir::new().unwrap();
    let config = TranslationConfig {
        target_langs: vec!["fr".to_string()],
        ..test_config(dir.path())
    };
    let cache = Arc::new(FragmentCache::new(config.cache_file()));
    let model = MockModel::new();
    let translator = translator(config, &model, &cache);

    let page = RenderedPage::new("a.html", HtmlTestHelper::blog_post());
    translator.translate_page(&page).await.unwrap();

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 2);
    let code_prompts = prompts
        .iter()
        .filter(|p| p.contains("source code block"))
        .count();
    assert_eq!(code_prompts, 1);
    assert!(prompts.iter().all(|p| p.contains("French")));
}

#[tokio::test]
async fn test_second_run_is_served_from_cache() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let page = RenderedPage::new("index.html", HtmlTestHelper::blog_post());

    let cache = Arc::new(FragmentCache::open(config.cache_file()).await);
    let first_model = MockModel::new();
    let first = translator(config.clone(), &first_model, &cache)
        .translate_page(&page)
        .await
        .unwrap();
    assert!(first_model.calls() > 0);
    assert!(!cache.is_dirty());
    assert!(config.cache_file().exists());

    // 从磁盘重新加载，模拟下一次构建
    let reopened = Arc::new(FragmentCache::open(config.cache_file()).await);
    assert_eq!(reopened.len(), cache.len());

    let second_model = MockModel::new();
    let second_translator = translator(config, &second_model, &reopened);
    let second = second_translator.translate_page(&page).await.unwrap();

    assert_eq!(second_model.calls(), 0);
    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.path, b.path);
        assert_eq!(a.html, b.html);
    }
    assert_eq!(second_translator.stats().cache_hits, 16);
}

#[tokio::test]
async fn test_failed_language_is_skipped_others_survive() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let cache = Arc::new(FragmentCache::new(config.cache_file()));
    let model = MockModel::failing_for("Japanese");
    let translator = translator(config, &model, &cache);

    let page = RenderedPage::new("post.html", HtmlTestHelper::blog_post());
    let records = translator.translate_page(&page).await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].lang, "fr");
    assert_eq!(records[0].path.pathname, "/fr/post.html");

    let stats = translator.stats();
    assert_eq!(stats.passes_skipped, 1);
    assert_eq!(stats.failed_chunks, 2);
    // 失败的语言没有写入缓存
    let fp = html_translate::translation::fingerprint("Welcome to the blog");
    assert_eq!(cache.get(&fp, "fr").as_deref(), Some("WELCOME TO THE BLOG"));
    assert!(cache.get(&fp, "ja").is_none());
}

#[tokio::test]
async fn test_page_without_units_is_copied_per_language() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let cache = Arc::new(FragmentCache::new(config.cache_file()));
    let model = MockModel::new();
    let translator = translator(config, &model, &cache);

    let source = HtmlTestHelper::empty_page();
    let page = RenderedPage::new("docs/empty.html", source.clone());
    let records = translator.translate_page(&page).await.unwrap();

    assert_eq!(model.calls(), 0);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].path.pathname, "/fr/docs/empty.html");
    assert_eq!(records[1].path.pathname, "/ja/docs/empty.html");
    assert!(records.iter().all(|r| r.html == source));
}

#[tokio::test]
async fn test_requests_respect_concurrency_limit() {
    let dir = TempDir::new().unwrap();
    let config = TranslationConfig {
        chunk_size: 1,
        max_concurrent_requests: 2,
        ..test_config(dir.path())
    };
    let cache = Arc::new(FragmentCache::new(config.cache_file()));
    let model = MockModel::new().with_delay(Duration::from_millis(10));
    let translator = translator(config, &model, &cache);

    let page = RenderedPage::new("post.html", HtmlTestHelper::blog_post());
    let records = translator.translate_page(&page).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(model.calls(), 16);
    assert!(model.peak_concurrency() <= 2);
}

#[tokio::test]
async fn test_html_lang_can_be_left_alone() {
    let dir = TempDir::new().unwrap();
    let config = TranslationConfig {
        set_html_lang: false,
        target_langs: vec!["de".to_string()],
        ..test_config(dir.path())
    };
    let cache = Arc::new(FragmentCache::new(config.cache_file()));
    let model = MockModel::new();
    let translator = translator(config, &model, &cache);

    let page = RenderedPage::new("p.html", HtmlTestHelper::blog_post());
    let records = translator.translate_page(&page).await.unwrap();

    assert_eq!(records.len(), 1);
    assert!(records[0].html.contains("<html lang=\"en\">"));
    assert!(records[0].html.contains("/de/d/e.html"));
}

#[tokio::test]
async fn test_code_with_angle_brackets_round_trips() {
    let dir = TempDir::new().unwrap();
    let config = TranslationConfig {
        target_langs: vec!["fr".to_string()],
        ..test_config(dir.path())
    };
    let cache = Arc::new(FragmentCache::new(config.cache_file()));
    // 模型按纯文本回复代码，尖括号不转义
    let model = ScriptedModel::new(vec![chunk_response(&[
        "<code>// créer une liste\nlet v: Vec<String> = Vec::new();</code>",
    ])]);
    let translator = PageTranslator::new(config, model.clone(), Arc::clone(&cache)).unwrap();

    let source = "<html><head></head><body><pre><code>// make a list\nlet v: Vec&lt;String&gt; = Vec::new();</code></pre></body></html>";
    let records = translator
        .translate_page(&RenderedPage::new("code.html", source))
        .await
        .unwrap();

    assert_eq!(model.calls(), 1);
    assert_eq!(records.len(), 1);
    let html = &records[0].html;
    assert!(html.contains("// créer une liste"));
    assert!(html.contains("let v: Vec&lt;String&gt; = Vec::new();"));
    assert!(!html.contains("<String>"));
    assert_eq!(translator.stats().passes_skipped, 0);
}

