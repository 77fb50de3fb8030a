//! 片段缓存
//!
//! `指纹 → (语言代码 → 译文片段)` 的进程级共享映射，持久化为一个
//! 美化输出的 JSON 对象。运行开始时显式 `open`，结束时 `close`。

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::translation::error::{TranslationError, TranslationResult};

// ============================================================================
// 指纹
// ============================================================================

/// 源片段的内容指纹（blake3，十六进制）
pub fn fingerprint(source: &str) -> String {
    blake3::hash(source.as_bytes()).to_hex().to_string()
}

// ============================================================================
// 核心类型
// ============================================================================

/// 缓存统计信息
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub total_entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

/// 片段缓存
///
/// 并发 `put` 直接写入分片映射；`flush` 由互斥锁串行化，
/// 前一次写盘完成后下一次才开始。
pub struct FragmentCache {
    path: PathBuf,
    entries: DashMap<String, HashMap<String, String>>,
    dirty: AtomicBool,
    flush_lock: Mutex<()>,
    hits: AtomicU64,
    misses: AtomicU64,
}

// ============================================================================
// 实现
// ============================================================================

impl FragmentCache {
    /// 创建空缓存，不读取磁盘
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: DashMap::new(),
            dirty: AtomicBool::new(false),
            flush_lock: Mutex::new(()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// 从磁盘加载缓存
    ///
    /// 文件不存在、读取失败或内容无法解析时都按冷启动处理，返回空缓存。
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let cache = Self::new(path);

        match tokio::fs::read_to_string(&cache.path).await {
            Ok(content) => match serde_json::from_str::<HashMap<String, HashMap<String, String>>>(
                &content,
            ) {
                Ok(map) => {
                    for (key, langs) in map {
                        cache.entries.insert(key, langs);
                    }
                    tracing::info!(
                        "已加载片段缓存: {} ({} 条)",
                        cache.path.display(),
                        cache.entries.len()
                    );
                }
                Err(e) => {
                    tracing::warn!("缓存文件无法解析，按空缓存处理: {}: {}", cache.path.display(), e);
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("缓存文件不存在，冷启动: {}", cache.path.display());
            }
            Err(e) => {
                tracing::warn!("读取缓存文件失败，按空缓存处理: {}: {}", cache.path.display(), e);
            }
        }

        cache
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 查询译文
    pub fn get(&self, fingerprint: &str, lang: &str) -> Option<String> {
        let found = self
            .entries
            .get(fingerprint)
            .and_then(|langs| langs.get(lang).cloned());

        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// 写入译文，同键覆盖
    pub fn put(&self, fingerprint: &str, lang: &str, fragment: impl Into<String>) {
        self.entries
            .entry(fingerprint.to_string())
            .or_default()
            .insert(lang.to_string(), fragment.into());
        self.dirty.store(true, Ordering::Release);
    }

    /// 指纹条目数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 是否有未落盘的修改
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            cache_hits: self.hits.load(Ordering::Relaxed),
            cache_misses: self.misses.load(Ordering::Relaxed),
            total_entries: self.entries.len(),
        }
    }

    /// 持久化完整映射
    ///
    /// 先写同目录临时文件再重命名，不会截断现有文件。写盘失败时
    /// 内存数据保持不变并重新标记为脏，下次 flush 再试。
    pub async fn flush(&self) -> TranslationResult<()> {
        let _guard = self.flush_lock.lock().await;

        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(());
        }

        if let Err(e) = self.write_snapshot().await {
            self.dirty.store(true, Ordering::Release);
            tracing::warn!("缓存写盘失败，保留内存数据: {}", e);
            return Err(e);
        }

        tracing::debug!("缓存已写盘: {} ({} 条)", self.path.display(), self.entries.len());
        Ok(())
    }

    /// 最后一次 flush
    pub async fn close(&self) -> TranslationResult<()> {
        self.flush().await?;
        let stats = self.stats();
        tracing::info!(
            "片段缓存关闭: {} 条, 命中 {}, 未命中 {}, 命中率 {:.1}%",
            stats.total_entries,
            stats.cache_hits,
            stats.cache_misses,
            stats.hit_rate() * 100.0
        );
        Ok(())
    }

    async fn write_snapshot(&self) -> TranslationResult<()> {
        // BTreeMap 保证输出顺序稳定
        let snapshot: BTreeMap<String, BTreeMap<String, String>> = self
            .entries
            .iter()
            .map(|entry| {
                let langs = entry
                    .value()
                    .iter()
                    .map(|(lang, text)| (lang.clone(), text.clone()))
                    .collect();
                (entry.key().clone(), langs)
            })
            .collect();

        let json = serde_json::to_string_pretty(&snapshot)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                TranslationError::CacheError(format!("创建缓存目录失败 {}: {}", parent.display(), e))
            })?;
        }

        let tmp_path = self.tmp_path();
        tokio::fs::write(&tmp_path, json).await.map_err(|e| {
            TranslationError::CacheError(format!("写入临时缓存文件失败 {}: {}", tmp_path.display(), e))
        })?;
        tokio::fs::rename(&tmp_path, &self.path).await.map_err(|e| {
            TranslationError::CacheError(format!("替换缓存文件失败 {}: {}", self.path.display(), e))
        })?;

        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "fragments.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_fingerprint_is_stable_and_content_addressed() {
        assert_eq!(fingerprint("Hello"), fingerprint("Hello"));
        assert_ne!(fingerprint("Hello"), fingerprint("Hello "));
        assert_eq!(fingerprint("").len(), 64);
    }

    #[test]
    fn test_get_put_and_stats() {
        let cache = FragmentCache::new("unused.json");
        assert_eq!(cache.get("k", "fr"), None);

        cache.put("k", "fr", "Bonjour");
        cache.put("k", "de", "Hallo");
        assert_eq!(cache.get("k", "fr").as_deref(), Some("Bonjour"));
        assert_eq!(cache.get("k", "ja"), None);
        assert_eq!(cache.len(), 1);

        let stats = cache.stats();
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.cache_misses, 2);
        assert!(cache.is_dirty());
    }

    #[tokio::test]
    async fn test_flush_creates_parent_dirs_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/fragments.json");

        let cache = FragmentCache::new(&path);
        cache.put(&fingerprint("Hi"), "fr", "Salut");
        cache.flush().await.unwrap();
        assert!(!cache.is_dirty());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\n  \""), "pretty-printed JSON expected");
        assert!(!path.with_file_name("fragments.json.tmp").exists());

        let reopened = FragmentCache::open(&path).await;
        assert_eq!(reopened.get(&fingerprint("Hi"), "fr").as_deref(), Some("Salut"));
    }

    #[tokio::test]
    async fn test_unreadable_cache_is_cold_start() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fragments.json");
        std::fs::write(&path, "{ not json").unwrap();

        let cache = FragmentCache::open(&path).await;
        assert!(cache.is_empty());

        let missing = FragmentCache::open(dir.path().join("absent.json")).await;
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_failed_flush_keeps_memory_and_rearms() {
        let dir = tempfile::tempdir().unwrap();
        // 父路径是一个普通文件，目录创建必然失败
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let cache = FragmentCache::new(blocker.join("fragments.json"));

        cache.put("k", "fr", "v");
        assert!(matches!(
            cache.flush().await,
            Err(TranslationError::CacheError(_))
        ));
        assert!(cache.is_dirty());
        assert_eq!(cache.get("k", "fr").as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_clean_flush_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fragments.json");
        let cache = FragmentCache::new(&path);

        cache.flush().await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_puts_and_flushes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fragments.json");
        let cache = Arc::new(FragmentCache::new(&path));

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move {
                    cache.put(&fingerprint(&format!("text {}", i)), "fr", format!("texte {}", i));
                    cache.flush().await
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }
        cache.close().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: HashMap<String, HashMap<String, String>> =
            serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.len(), 32);
    }
}
