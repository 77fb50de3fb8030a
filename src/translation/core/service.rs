//! 页面翻译服务
//!
//! 每个渲染好的页面、每个目标语言走一遍：
//!
//! ```text
//! 解析 → 分类单元 → 缓存查询 → 批次编排未命中单元 → 合并回树 → 本地化链接 → 序列化
//! ```
//!
//! 每个语言的处理各自解析一棵新树，互不共享；模型调用统一经过同一个
//! 任务队列限流。任何单元缺少译文时跳过该语言，不影响其他语言和页面。

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use markup5ever_rcdom::{Handle, NodeData};

use super::client::ChatModel;
use super::queue::TaskQueue;
use crate::parsers::html::{
    get_child_node_by_name, get_node_name, parse_document, parse_fragment,
    replace_attrs, replace_children, serialize_document, set_node_attr, FragmentScope,
};
use crate::parsers::localize_links;
use crate::translation::config::TranslationConfig;
use crate::translation::error::{helpers::log_error, TranslationError, TranslationResult};
use crate::translation::pipeline::{BatchOrchestrator, PendingUnit, TranslationUnit, TreeClassifier};
use crate::translation::storage::FragmentCache;

// ============================================================================
// 页面记录
// ============================================================================

/// 宿主交给管道的渲染结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// 相对页面根目录的路径，如 `blog/post.html`
    pub path: String,
    pub html: String,
}

impl RenderedPage {
    pub fn new(path: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            html: html.into(),
        }
    }
}

/// 生成页面的路径
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePath {
    /// `/fr/blog/post.html`
    pub pathname: String,
    /// `/fr/blog`
    pub dirname: String,
    /// `post.html`
    pub filename: String,
}

impl PagePath {
    /// 把站点相对路径放到 `/<lang>/` 之下
    pub fn localized(lang: &str, page_path: &str) -> Self {
        let relative = page_path.replace('\\', "/");
        let relative = relative.trim_start_matches('/');
        let pathname = format!("/{}/{}", lang, relative);

        let (dirname, filename) = match pathname.rsplit_once('/') {
            Some((dir, file)) => (dir.to_string(), file.to_string()),
            None => (String::new(), pathname.clone()),
        };

        Self {
            pathname,
            dirname,
            filename,
        }
    }
}

/// 管道产出的页面
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPage {
    pub lang: String,
    pub path: PagePath,
    pub html: String,
}

// ============================================================================
// 统计
// ============================================================================

/// 服务运行统计
#[derive(Debug, Default)]
pub struct ServiceStats {
    pages_processed: AtomicUsize,
    pages_generated: AtomicUsize,
    passes_skipped: AtomicUsize,
    units_total: AtomicUsize,
    cache_hits: AtomicUsize,
    model_calls: AtomicUsize,
    retries: AtomicUsize,
    failed_chunks: AtomicUsize,
}

/// 统计快照
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ServiceStatsSnapshot {
    pub pages_processed: usize,
    pub pages_generated: usize,
    pub passes_skipped: usize,
    pub units_total: usize,
    pub cache_hits: usize,
    pub model_calls: usize,
    pub retries: usize,
    pub failed_chunks: usize,
}

impl ServiceStats {
    pub fn snapshot(&self) -> ServiceStatsSnapshot {
        ServiceStatsSnapshot {
            pages_processed: self.pages_processed.load(Ordering::Relaxed),
            pages_generated: self.pages_generated.load(Ordering::Relaxed),
            passes_skipped: self.passes_skipped.load(Ordering::Relaxed),
            units_total: self.units_total.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            model_calls: self.model_calls.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            failed_chunks: self.failed_chunks.load(Ordering::Relaxed),
        }
    }
}

// ============================================================================
// 页面翻译器
// ============================================================================

/// 页面翻译器
pub struct PageTranslator<M: ChatModel> {
    config: Arc<TranslationConfig>,
    cache: Arc<FragmentCache>,
    orchestrator: BatchOrchestrator<M>,
    stats: ServiceStats,
}

impl<M: ChatModel> PageTranslator<M> {
    /// 创建翻译器；配置不合法时立即返回 `ConfigError`
    pub fn new(
        config: TranslationConfig,
        model: M,
        cache: Arc<FragmentCache>,
    ) -> TranslationResult<Self> {
        config.validate()?;

        let config = Arc::new(config);
        let queue = TaskQueue::new(config.max_concurrent_requests);
        let orchestrator = BatchOrchestrator::new(
            Arc::new(model),
            Arc::clone(&cache),
            queue,
            Arc::clone(&config),
        );

        Ok(Self {
            config,
            cache,
            orchestrator,
            stats: ServiceStats::default(),
        })
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<FragmentCache> {
        &self.cache
    }

    pub fn stats(&self) -> ServiceStatsSnapshot {
        self.stats.snapshot()
    }

    /// 翻译一个页面到所有目标语言
    ///
    /// 返回每个成功语言一条记录；没有翻译单元的页面按语言原样复制。
    /// 被跳过的语言只记录日志。处理完后写一次缓存。
    pub async fn translate_page(&self, page: &RenderedPage) -> TranslationResult<Vec<GeneratedPage>> {
        let started = Instant::now();
        self.stats.pages_processed.fetch_add(1, Ordering::Relaxed);

        let scan = parse_document(&page.html);
        let unit_count = TreeClassifier::default().classify(&scan.document)?.len();
        drop(scan);

        if unit_count == 0 {
            tracing::debug!("页面没有翻译单元，原样复制: {}", page.path);
            let copies: Vec<_> = self
                .config
                .target_langs
                .iter()
                .map(|lang| GeneratedPage {
                    lang: lang.clone(),
                    path: PagePath::localized(lang, &page.path),
                    html: page.html.clone(),
                })
                .collect();
            self.stats
                .pages_generated
                .fetch_add(copies.len(), Ordering::Relaxed);
            return Ok(copies);
        }

        let passes = self
            .config
            .target_langs
            .iter()
            .map(|lang| self.translate_pass(page, lang));
        let results = join_all(passes).await;

        let mut generated = Vec::with_capacity(results.len());
        for (lang, result) in self.config.target_langs.iter().zip(results) {
            match result {
                Ok(record) => generated.push(record),
                Err(TranslationError::IncompletePage { missing }) => {
                    self.stats.passes_skipped.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        lang = %lang,
                        "{} 有 {} 个单元没有译文，跳过生成",
                        page.path,
                        missing
                    );
                }
                Err(e) => {
                    self.stats.passes_skipped.fetch_add(1, Ordering::Relaxed);
                    log_error(&e.with_context(format!("{} [{}]", page.path, lang)));
                }
            }
        }
        self.stats
            .pages_generated
            .fetch_add(generated.len(), Ordering::Relaxed);

        if let Err(e) = self.cache.flush().await {
            tracing::warn!("页面处理后写缓存失败，将在下次重试: {}", e);
        }

        tracing::info!(
            "页面完成: {} ({} 单元, {}/{} 语言, 耗时 {:?})",
            page.path,
            unit_count,
            generated.len(),
            self.config.target_langs.len(),
            started.elapsed()
        );

        Ok(generated)
    }

    /// 单个语言的处理
    async fn translate_pass(&self, page: &RenderedPage, lang: &str) -> TranslationResult<GeneratedPage> {
        let dom = parse_document(&page.html);
        let units = TreeClassifier::default().classify(&dom.document)?;
        self.stats
            .units_total
            .fetch_add(units.len(), Ordering::Relaxed);

        let mut resolved: HashMap<usize, String> = HashMap::with_capacity(units.len());
        let mut pending = Vec::new();
        for (id, unit) in units.iter().enumerate() {
            let fingerprint = unit.fingerprint();
            match self.cache.get(&fingerprint, lang) {
                Some(translated) => {
                    resolved.insert(id, translated);
                }
                None => pending.push(PendingUnit {
                    id,
                    fingerprint,
                    source: unit.source.clone(),
                    context: unit.parse_context(),
                    is_code: unit.is_code,
                }),
            }
        }
        let cache_hits = resolved.len();
        self.stats
            .cache_hits
            .fetch_add(cache_hits, Ordering::Relaxed);

        if !pending.is_empty() {
            let outcome = self.orchestrator.translate(pending, lang).await;
            self.stats
                .model_calls
                .fetch_add(outcome.stats.model_calls, Ordering::Relaxed);
            self.stats
                .retries
                .fetch_add(outcome.stats.retries, Ordering::Relaxed);
            self.stats
                .failed_chunks
                .fetch_add(outcome.stats.failed_chunks, Ordering::Relaxed);
            tracing::debug!(
                lang = %lang,
                "{}: 缓存命中 {}, chunk {}, 调用 {}, 重试 {}, 失败 chunk {}",
                page.path,
                cache_hits,
                outcome.stats.chunks,
                outcome.stats.model_calls,
                outcome.stats.retries,
                outcome.stats.failed_chunks
            );
            resolved.extend(outcome.resolved);
        }

        let mut missing = (0..units.len())
            .filter(|id| !resolved.contains_key(id))
            .count();
        if missing > 0 {
            return Err(TranslationError::IncompletePage { missing });
        }

        for (id, unit) in units.iter().enumerate() {
            if !apply_translation(unit, &resolved[&id]) {
                missing += 1;
            }
        }
        if missing > 0 {
            return Err(TranslationError::IncompletePage { missing });
        }

        localize_links(&dom.document, lang, &page.path);
        if self.config.set_html_lang {
            if let Some(html) = get_child_node_by_name(&dom.document, "html") {
                set_node_attr(&html, "lang", Some(lang.to_string()));
            }
        }

        Ok(GeneratedPage {
            lang: lang.to_string(),
            path: PagePath::localized(lang, &page.path),
            html: serialize_document(&dom)?,
        })
    }
}

/// 把译文合并回单元节点
///
/// inner 片段在节点自身的上下文中解析并替换子节点；outer 片段在父节点上下文
/// 中解析，取出同名元素，用它的属性和子节点替换原节点的属性和子节点。
fn apply_translation(unit: &TranslationUnit, translated: &str) -> bool {
    match unit.scope() {
        FragmentScope::Inner => {
            let nodes = parse_fragment(translated, &unit.parse_context());
            replace_children(&unit.node, nodes);
            true
        }
        FragmentScope::Outer => {
            let context = unit.parse_context();
            let replacement = find_element(&parse_fragment(translated, &context), unit.tag_name())
                .or_else(|| find_element(&parse_fragment(translated, "template"), unit.tag_name()));

            let Some(replacement) = replacement else {
                tracing::warn!("译文中找不到 <{}> 元素，无法合并", unit.tag_name());
                return false;
            };

            if let NodeData::Element { ref attrs, .. } = replacement.data {
                replace_attrs(&unit.node, attrs.borrow().clone());
            }
            let children = std::mem::take(&mut *replacement.children.borrow_mut());
            replace_children(&unit.node, children);
            true
        }
    }
}

fn find_element(nodes: &[Handle], tag: &str) -> Option<Handle> {
    nodes
        .iter()
        .find(|node| get_node_name(node) == Some(tag))
        .cloned()
}
