//! 翻译配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

// 重新导出主要类型
pub use manager::{ConfigManager, TranslationConfig};

/// 配置常量
pub mod constants {
    // 跳过的元素：整棵子树不参与翻译
    pub const SKIP_TAGS: &[&str] = &["script", "style", "svg", "noscript", "iframe", "template"];

    // 语义块元素：自身或后代有文本即成为翻译单元，不再下钻
    // code/pre 刻意放在这里，整块交给代码提示词处理
    pub const SEMANTIC_TAGS: &[&str] = &[
        "p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "blockquote", "td", "th", "figcaption",
        "caption", "dt", "dd", "summary", "option", "legend", "code", "pre",
    ];

    // 容器元素：只有直接文本子节点时才成为翻译单元
    pub const CONTAINER_TAGS: &[&str] = &[
        "div", "span", "section", "article", "aside", "header", "footer", "main", "form", "nav",
        "figure", "details",
    ];

    // 可翻译属性
    // `tag[attr=value]:name` 限定元素与属性值；`meta[key]` 指 name/property 为 key 的 meta 的 content
    pub const TRANSLATABLE_ATTRS: &[&str] = &[
        "alt",
        "title",
        "placeholder",
        "label",
        "aria-label",
        "aria-description",
        "aria-valuetext",
        "aria-roledescription",
        "aria-placeholder",
        "abbr",
        "summary",
        "input[type=button]:value",
        "input[type=submit]:value",
        "input[type=reset]:value",
        "meta[description]",
        "meta[og:title]",
        "meta[og:description]",
        "meta[twitter:title]",
        "meta[twitter:description]",
    ];

    // 结构校验比较的属性
    pub const STRUCTURAL_ATTRS: &[&str] = &["href", "src", "class", "id"];

    // 长度比校验
    pub const SHORT_TEXT_THRESHOLD: usize = 5;
    pub const MIN_LENGTH_RATIO: f64 = 0.3;
    pub const MAX_LENGTH_RATIO: f64 = 5.0;
    pub const CJK_MIN_LENGTH_RATIO: f64 = 0.1;
    pub const CJK_MAX_LENGTH_RATIO: f64 = 8.0;

    // 默认API设置
    pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
    pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

    // 批次设置
    pub const DEFAULT_CHUNK_SIZE: usize = 10;
    pub const DEFAULT_MAX_RETRIES: usize = 3;
    pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 4;
    pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;

    // 缓存设置
    pub const DEFAULT_CACHE_PATH: &str = ".cache/html-translate/fragments.json";

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "html-translate.toml",
        ".html-translate.toml",
        "html-translate.json",
        "~/.config/html-translate/config.toml",
    ];
}

