//! 批次编排
//!
//! 一次（页面, 语言）处理中所有未命中缓存的单元在这里被切成固定大小的
//! chunk，每个 chunk 作为一个任务提交到 [`TaskQueue`]：
//!
//! 1. 编码载荷，按 chunk 类型选择提示词，调用模型；代码单元以原样文本发送
//! 2. 解码响应，代码回复重新转义，逐个元素在单元自己的解析上下文中还原属性并校验
//! 3. 任何失败（HTTP、缺失 chunk、校验、解码）都整块重试，直到用完预算
//! 4. 成功的单元立即写入片段缓存；用完预算的 chunk 整体丢弃
//!
//! 各 chunk 互不影响，一个 chunk 的失败不会波及兄弟 chunk。

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio::time::sleep;

use super::codec::{decode_payload, encode_payload, escape_code_reply, raw_code_text};
use super::prompts::{system_prompt, PromptKind};
use crate::translation::config::TranslationConfig;
use crate::translation::core::client::{ChatModel, ChatRequest};
use crate::translation::core::queue::TaskQueue;
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::storage::FragmentCache;
use crate::translation::validation::{restore_attributes_in, validate_fragment_in};

// ============================================================================
// 核心类型
// ============================================================================

/// 等待翻译的单元
///
/// 只携带字符串，不引用 DOM 节点，可以在任务之间自由移动。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUnit {
    /// 调用方自定义的单元编号，结果按此编号返回
    pub id: usize,
    pub fingerprint: String,
    pub source: String,
    pub is_code: bool,
    /// 合并回页面时解析片段所用的上下文元素名
    pub context: String,
}

impl PendingUnit {
    fn is_blank(&self) -> bool {
        self.source.trim().is_empty()
    }
}

/// 批次统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    pub chunks: usize,
    pub retries: usize,
    pub failed_chunks: usize,
    pub resolved_units: usize,
    pub model_calls: usize,
}

/// 一次编排的结果
#[derive(Debug, Default, Clone)]
pub struct BatchOutcome {
    /// 单元编号 → 译文；缺席即未解析
    pub resolved: HashMap<usize, String>,
    pub stats: BatchStats,
}

struct ChunkReport {
    index: usize,
    resolved: Option<Vec<(usize, String)>>,
    attempts: usize,
}

/// 批次编排器
pub struct BatchOrchestrator<M: ChatModel> {
    model: Arc<M>,
    cache: Arc<FragmentCache>,
    queue: TaskQueue,
    config: Arc<TranslationConfig>,
}

// ============================================================================
// 实现
// ============================================================================

impl<M: ChatModel> BatchOrchestrator<M> {
    pub fn new(
        model: Arc<M>,
        cache: Arc<FragmentCache>,
        queue: TaskQueue,
        config: Arc<TranslationConfig>,
    ) -> Self {
        Self {
            model,
            cache,
            queue,
            config,
        }
    }

    /// 翻译一组单元到 `lang`
    ///
    /// 空白单元直接解析为自身，不调用模型。
    pub async fn translate(&self, units: Vec<PendingUnit>, lang: &str) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        let (blank, units): (Vec<_>, Vec<_>) = units.into_iter().partition(PendingUnit::is_blank);
        for unit in blank {
            outcome.resolved.insert(unit.id, unit.source);
        }

        if units.is_empty() {
            return outcome;
        }

        let (code, text): (Vec<_>, Vec<_>) = units.into_iter().partition(|unit| unit.is_code);
        let chunk_size = self.config.chunk_size.max(1);
        let chunks: Vec<(PromptKind, &[PendingUnit])> = text
            .chunks(chunk_size)
            .map(|chunk| (PromptKind::Text, chunk))
            .chain(code.chunks(chunk_size).map(|chunk| (PromptKind::Code, chunk)))
            .collect();

        outcome.stats.chunks = chunks.len();
        tracing::debug!(
            lang = %lang,
            "提交 {} 个 chunk ({} 文本单元, {} 代码单元)",
            chunks.len(),
            text.len(),
            code.len()
        );

        let tasks = chunks.into_iter().enumerate().map(|(index, (kind, chunk))| {
            self.queue
                .add(move || self.run_chunk(index, kind, chunk, lang))
        });

        for report in join_all(tasks).await {
            let report = match report {
                Ok(report) => report,
                Err(e) => {
                    tracing::warn!(lang = %lang, "chunk 未能进入队列: {}", e);
                    outcome.stats.failed_chunks += 1;
                    continue;
                }
            };

            outcome.stats.model_calls += report.attempts;
            outcome.stats.retries += report.attempts.saturating_sub(1);

            match report.resolved {
                Some(resolved) => {
                    outcome.stats.resolved_units += resolved.len();
                    outcome.resolved.extend(resolved);
                }
                None => {
                    tracing::debug!(lang = %lang, chunk = report.index, "chunk 已丢弃");
                    outcome.stats.failed_chunks += 1;
                }
            }
        }

        outcome
    }

    /// 带重试的单个 chunk
    ///
    /// 总尝试次数为 1 + `max_retries`。
    async fn run_chunk(
        &self,
        index: usize,
        kind: PromptKind,
        chunk: &[PendingUnit],
        lang: &str,
    ) -> TranslationResult<ChunkReport> {
        let max_attempts = self.config.max_retries.saturating_add(1);
        let mut attempts = 0;

        while attempts < max_attempts {
            if attempts > 0 {
                sleep(self.config.retry_delay(attempts - 1)).await;
            }
            attempts += 1;

            match self.attempt(kind, chunk, lang).await {
                Ok(resolved) => {
                    for ((_, text), unit) in resolved.iter().zip(chunk) {
                        self.cache.put(&unit.fingerprint, lang, text.as_str());
                    }
                    if attempts > 1 {
                        tracing::info!(lang = %lang, chunk = index, "chunk 在第 {} 次尝试后成功", attempts);
                    } else {
                        tracing::debug!(lang = %lang, chunk = index, "chunk 完成: {} 单元", resolved.len());
                    }
                    return Ok(ChunkReport {
                        index,
                        resolved: Some(resolved),
                        attempts,
                    });
                }
                Err(e) if e.is_retryable() && attempts < max_attempts => {
                    tracing::warn!(
                        lang = %lang,
                        chunk = index,
                        "chunk 第 {}/{} 次尝试失败，准备重试: {}",
                        attempts,
                        max_attempts,
                        e
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        lang = %lang,
                        chunk = index,
                        "chunk 在 {} 次尝试后放弃: {}",
                        attempts,
                        e
                    );
                    break;
                }
            }
        }

        Ok(ChunkReport {
            index,
            resolved: None,
            attempts,
        })
    }

    /// 单次尝试：编码、调用、解码、还原、校验
    async fn attempt(
        &self,
        kind: PromptKind,
        chunk: &[PendingUnit],
        lang: &str,
    ) -> TranslationResult<Vec<(usize, String)>> {
        let sources: Vec<String> = chunk
            .iter()
            .map(|unit| {
                if unit.is_code {
                    raw_code_text(&unit.source)
                } else {
                    unit.source.clone()
                }
            })
            .collect();
        let request = ChatRequest::new(
            &self.config,
            system_prompt(kind, &self.config.source_lang, lang),
            encode_payload(&sources),
        );

        let response = self.model.complete(&request).await?;
        let mut decoded = decode_payload(&response);

        let mut resolved = Vec::with_capacity(chunk.len());
        for (position, unit) in chunk.iter().enumerate() {
            let translated = decoded
                .remove(&position)
                .ok_or(TranslationError::MissingChunk(position))?;
            let translated = if unit.is_code {
                escape_code_reply(&translated, &unit.source)
            } else {
                translated
            };

            let restored = restore_attributes_in(&unit.context, &unit.source, &translated);
            let validation = validate_fragment_in(&unit.context, &unit.source, &restored);
            if !validation.valid {
                tracing::debug!(
                    source = ?validation.source,
                    target = ?validation.target,
                    "校验失败"
                );
                return Err(TranslationError::ValidationFailed(format!(
                    "chunk 元素 {}: {}",
                    position,
                    validation.reason_or_default()
                )));
            }

            resolved.push((unit.id, restored));
        }

        Ok(resolved)
    }
}
