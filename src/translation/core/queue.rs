//! 有界并发任务队列
//!
//! 计数信号量加 FIFO 等待：最多 N 个任务同时运行，多余的任务按提交顺序
//! 排队，任一任务结束（无论成功失败）立即放行下一个。N 为 1 时即严格串行。

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::translation::error::{TranslationError, TranslationResult};

/// 任务队列
#[derive(Debug, Clone)]
pub struct TaskQueue {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

impl TaskQueue {
    /// 创建并发上限为 `limit` 的队列，0 按 1 处理
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    /// 严格串行队列
    pub fn sequential() -> Self {
        Self::new(1)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// 当前空闲槽位
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// 提交任务并等待其结果
    ///
    /// 许可在任务返回（或被丢弃）时释放，失败的任务不会卡住队列。
    pub async fn add<F, Fut, T>(&self, task: F) -> TranslationResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = TranslationResult<T>>,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| TranslationError::ConcurrencyError(format!("获取并发许可失败: {}", e)))?;

        task().await
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new(crate::translation::config::constants::DEFAULT_MAX_CONCURRENT_REQUESTS)
    }
}
