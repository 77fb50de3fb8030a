//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问

use std::env;
use std::fmt;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    /// 读取变量；未设置时返回 `Ok(None)`
    fn get() -> EnvResult<Option<T>> {
        match env::var(Self::NAME) {
            Ok(value) if !value.trim().is_empty() => Self::parse(value.trim()).map(Some),
            _ => Ok(None),
        }
    }
}

fn describe<T, V: EnvVar<T>>() -> (&'static str, &'static str) {
    (V::NAME, V::DESCRIPTION)
}

/// 命令行 `--help` 末尾的环境变量说明
pub fn help_text() -> String {
    use self::translation::*;

    let rows = [
        describe::<String, SourceLang>(),
        describe::<Vec<String>, TargetLangs>(),
        describe::<String, ApiUrl>(),
        describe::<String, ApiKey>(),
        describe::<String, Model>(),
        describe::<usize, ChunkSize>(),
        describe::<usize, MaxRetries>(),
        describe::<usize, Concurrency>(),
        describe::<String, cache::Path>(),
    ];

    let fallback = ("OPENAI_API_KEY", "Fallback for HTML_TRANSLATE_API_KEY");

    let mut text = String::from("Environment variables:\n");
    for (name, description) in rows.into_iter().chain([fallback]) {
        text.push_str(&format!("  {:<28} {}\n", name, description));
    }
    text
}

fn parse_usize(value: &str, name: &str) -> EnvResult<usize> {
    value.parse::<usize>().map_err(|_| EnvError {
        variable: name.to_string(),
        message: format!("Invalid number '{}'", value),
    })
}

/// 翻译相关环境变量
pub mod translation {
    use super::*;

    /// 源语言代码
    pub struct SourceLang;
    impl EnvVar<String> for SourceLang {
        const NAME: &'static str = "HTML_TRANSLATE_SOURCE_LANG";
        const DESCRIPTION: &'static str = "Source language code, e.g. en";

        fn parse(value: &str) -> EnvResult<String> {
            Ok(value.to_string())
        }
    }

    /// 目标语言代码列表（逗号分隔）
    pub struct TargetLangs;
    impl EnvVar<Vec<String>> for TargetLangs {
        const NAME: &'static str = "HTML_TRANSLATE_TARGET_LANGS";
        const DESCRIPTION: &'static str = "Comma-separated target language codes, e.g. fr,ja";

        fn parse(value: &str) -> EnvResult<Vec<String>> {
            let langs: Vec<String> = value
                .split(',')
                .map(str::trim)
                .filter(|lang| !lang.is_empty())
                .map(str::to_string)
                .collect();

            if langs.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "No language codes given".to_string(),
                });
            }
            Ok(langs)
        }
    }

    /// Chat completion 端点
    pub struct ApiUrl;
    impl EnvVar<String> for ApiUrl {
        const NAME: &'static str = "HTML_TRANSLATE_API_URL";
        const DESCRIPTION: &'static str = "Chat-completion endpoint URL";

        fn parse(value: &str) -> EnvResult<String> {
            if value.starts_with("http://") || value.starts_with("https://") {
                Ok(value.to_string())
            } else {
                Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!("URL must start with http:// or https://, got '{}'", value),
                })
            }
        }
    }

    /// API 密钥
    pub struct ApiKey;
    impl EnvVar<String> for ApiKey {
        const NAME: &'static str = "HTML_TRANSLATE_API_KEY";
        const DESCRIPTION: &'static str = "Bearer token for the chat-completion endpoint";

        fn parse(value: &str) -> EnvResult<String> {
            Ok(value.to_string())
        }

        fn get() -> EnvResult<Option<String>> {
            for name in [Self::NAME, "OPENAI_API_KEY"] {
                if let Ok(value) = env::var(name) {
                    if !value.trim().is_empty() {
                        return Ok(Some(value.trim().to_string()));
                    }
                }
            }
            Ok(None)
        }
    }

    /// 模型名
    pub struct Model;
    impl EnvVar<String> for Model {
        const NAME: &'static str = "HTML_TRANSLATE_MODEL";
        const DESCRIPTION: &'static str = "Model name sent with every request";

        fn parse(value: &str) -> EnvResult<String> {
            Ok(value.to_string())
        }
    }

    /// 每个请求的翻译单元数
    pub struct ChunkSize;
    impl EnvVar<usize> for ChunkSize {
        const NAME: &'static str = "HTML_TRANSLATE_CHUNK_SIZE";
        const DESCRIPTION: &'static str = "Translation units per request";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_usize(value, Self::NAME)
        }
    }

    /// 每个 chunk 的重试次数
    pub struct MaxRetries;
    impl EnvVar<usize> for MaxRetries {
        const NAME: &'static str = "HTML_TRANSLATE_MAX_RETRIES";
        const DESCRIPTION: &'static str = "Retries per chunk after the first attempt";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_usize(value, Self::NAME)
        }
    }

    /// 并发请求上限
    pub struct Concurrency;
    impl EnvVar<usize> for Concurrency {
        const NAME: &'static str = "HTML_TRANSLATE_CONCURRENCY";
        const DESCRIPTION: &'static str = "Maximum in-flight model calls (1 = sequential)";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_usize(value, Self::NAME)
        }
    }
}

/// 缓存相关环境变量
pub mod cache {
    use super::*;

    /// 缓存文件路径
    pub struct Path;
    impl EnvVar<String> for Path {
        const NAME: &'static str = "HTML_TRANSLATE_CACHE_PATH";
        const DESCRIPTION: &'static str = "Fragment cache JSON file";

        fn parse(value: &str) -> EnvResult<String> {
            Ok(value.to_string())
        }
    }
}
