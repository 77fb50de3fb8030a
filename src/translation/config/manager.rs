//! 简化的配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::env::{cache, translation, EnvVar};
use crate::translation::error::{TranslationError, TranslationResult};

/// 翻译配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslationConfig {
    // 语言
    pub source_lang: String,
    pub target_langs: Vec<String>,

    // 模型调用
    pub api_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    pub request_timeout_secs: u64,

    // 批次与并发
    pub chunk_size: usize,
    pub max_retries: usize,
    /// 重试基础间隔，按 2 的幂次退避；0 表示立即重试
    pub retry_delay_ms: u64,
    pub max_concurrent_requests: usize,

    // 缓存与输出
    pub cache_path: String,
    pub pages_root: String,
    pub set_html_lang: bool,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            source_lang: String::new(),
            target_langs: Vec::new(),

            api_url: constants::DEFAULT_API_URL.to_string(),
            api_key: None,
            model: constants::DEFAULT_MODEL.to_string(),
            max_tokens: None,
            temperature: None,
            top_p: None,
            frequency_penalty: None,
            presence_penalty: None,
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT_SECS,

            chunk_size: constants::DEFAULT_CHUNK_SIZE,
            max_retries: constants::DEFAULT_MAX_RETRIES,
            retry_delay_ms: constants::DEFAULT_RETRY_DELAY_MS,
            max_concurrent_requests: constants::DEFAULT_MAX_CONCURRENT_REQUESTS,

            cache_path: constants::DEFAULT_CACHE_PATH.to_string(),
            pages_root: ".".to_string(),
            set_html_lang: true,
        }
    }
}

impl TranslationConfig {
    /// 创建带指定语言的默认配置
    pub fn with_langs(source_lang: &str, target_langs: &[&str]) -> Self {
        Self {
            source_lang: source_lang.to_string(),
            target_langs: target_langs.iter().map(|lang| lang.to_string()).collect(),
            ..Self::default()
        }
    }

    /// 验证配置
    ///
    /// 语言设置缺失属于致命错误，在启动时立即报告。
    pub fn validate(&self) -> TranslationResult<()> {
        if self.source_lang.trim().is_empty() {
            return Err(TranslationError::ConfigError("未设置源语言 source_lang".to_string()));
        }

        if self.target_langs.is_empty() {
            return Err(TranslationError::ConfigError("未设置目标语言 target_langs".to_string()));
        }

        if self.target_langs.iter().any(|lang| lang.trim().is_empty()) {
            return Err(TranslationError::ConfigError("目标语言代码不能为空".to_string()));
        }

        if self.target_langs.iter().any(|lang| lang == &self.source_lang) {
            return Err(TranslationError::ConfigError(format!(
                "目标语言不能与源语言相同: {}",
                self.source_lang
            )));
        }

        if self.chunk_size == 0 {
            return Err(TranslationError::ConfigError("chunk_size 不能为0".to_string()));
        }

        if self.max_concurrent_requests == 0 {
            return Err(TranslationError::ConfigError("最大并发数不能为0".to_string()));
        }

        Ok(())
    }

    /// 应用环境变量覆盖
    pub fn apply_env_overrides(&mut self) {
        fn warn_invalid(e: crate::env::EnvError) {
            tracing::warn!("忽略无效的环境变量: {}", e);
        }

        match translation::SourceLang::get() {
            Ok(Some(lang)) => self.source_lang = lang,
            Ok(None) => {}
            Err(e) => warn_invalid(e),
        }

        match translation::TargetLangs::get() {
            Ok(Some(langs)) => self.target_langs = langs,
            Ok(None) => {}
            Err(e) => warn_invalid(e),
        }

        match translation::ApiUrl::get() {
            Ok(Some(url)) => {
                tracing::info!("环境变量覆盖 API URL: {}", url);
                self.api_url = url;
            }
            Ok(None) => {}
            Err(e) => warn_invalid(e),
        }

        match translation::ApiKey::get() {
            Ok(Some(key)) => self.api_key = Some(key),
            Ok(None) => {}
            Err(e) => warn_invalid(e),
        }

        match translation::Model::get() {
            Ok(Some(model)) => self.model = model,
            Ok(None) => {}
            Err(e) => warn_invalid(e),
        }

        match translation::ChunkSize::get() {
            Ok(Some(size)) => self.chunk_size = size,
            Ok(None) => {}
            Err(e) => warn_invalid(e),
        }

        match translation::MaxRetries::get() {
            Ok(Some(retries)) => self.max_retries = retries,
            Ok(None) => {}
            Err(e) => warn_invalid(e),
        }

        match translation::Concurrency::get() {
            Ok(Some(limit)) => self.max_concurrent_requests = limit,
            Ok(None) => {}
            Err(e) => warn_invalid(e),
        }

        match cache::Path::get() {
            Ok(Some(path)) => self.cache_path = path,
            Ok(None) => {}
            Err(e) => warn_invalid(e),
        }
    }

    /// 请求超时
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 第 `attempt` 次重试前的等待时间
    pub fn retry_delay(&self, attempt: usize) -> Duration {
        let factor = 1u64 << attempt.min(6);
        Duration::from_millis(self.retry_delay_ms.saturating_mul(factor))
    }

    /// 展开 `~` 之后的缓存文件路径
    pub fn cache_file(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.cache_path).as_ref())
    }

    /// 展开 `~` 之后的页面根目录
    pub fn pages_root_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.pages_root).as_ref())
    }
}

/// 简化的配置管理器
pub struct ConfigManager {
    config: TranslationConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// 创建新的配置管理器：搜索配置文件、应用环境变量并验证
    pub fn new() -> TranslationResult<Self> {
        let manager = Self::load(None)?;
        manager.config.validate()?;
        Ok(manager)
    }

    /// 加载配置但不验证，便于调用方先叠加命令行参数
    pub fn load(explicit_path: Option<&Path>) -> TranslationResult<Self> {
        Self::load_dotenv();

        let (mut config, config_path) = match explicit_path {
            Some(path) => (Self::load_from_file(path)?, Some(path.to_path_buf())),
            None => Self::search_config()?,
        };
        config.apply_env_overrides();

        Ok(Self {
            config,
            config_path,
        })
    }

    /// 获取配置
    pub fn get_config(&self) -> &TranslationConfig {
        &self.config
    }

    /// 取出配置
    pub fn into_config(self) -> TranslationConfig {
        self.config
    }

    /// 实际加载的配置文件
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    fn search_config() -> TranslationResult<(TranslationConfig, Option<PathBuf>)> {
        for path in constants::CONFIG_PATHS {
            let expanded_path = PathBuf::from(shellexpand::tilde(path).as_ref());
            if expanded_path.exists() {
                tracing::info!("加载配置文件: {}", expanded_path.display());
                let config = Self::load_from_file(&expanded_path)?;
                return Ok((config, Some(expanded_path)));
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok((TranslationConfig::default(), None))
    }

    /// 从指定文件加载配置
    fn load_from_file(path: &Path) -> TranslationResult<TranslationConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslationError::ConfigError(format!("读取配置文件失败: {}", e)))?;

        let is_json = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            serde_json::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析JSON配置失败: {}", e)))
        } else {
            toml::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析TOML配置失败: {}", e)))
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        let env_files = [".env.local", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &Path) -> TranslationResult<()> {
        let config = TranslationConfig::with_langs("en", &["fr", "ja"]);
        let content = toml::to_string_pretty(&config)
            .map_err(|e| TranslationError::ConfigError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TranslationError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}
