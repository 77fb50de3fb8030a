//! html-translate 命令行入口
//!
//! 遍历页面根目录下的 `*.html`，逐页交给翻译管道，把每种语言的结果写到
//! `<out>/<lang>/...`。

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches, Parser};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use html_translate::env;
use html_translate::parsers::html::decode_html;
use html_translate::translation::config::ConfigManager;
use html_translate::translation::{
    FragmentCache, OpenAiClient, PageTranslator, RenderedPage, TranslationConfig,
    TranslationError, TranslationResult,
};

#[derive(Debug, Parser)]
#[command(name = "html-translate", version, about = "Translate rendered HTML pages into multiple languages")]
struct Arguments {
    /// Pages root directory (overrides config file)
    pages_root: Option<PathBuf>,

    /// Config file (TOML or JSON); searched in default locations when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory, defaults to the pages root
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Target language, repeatable (overrides config file)
    #[arg(short, long = "lang", value_name = "CODE")]
    langs: Vec<String>,

    /// Source language (overrides config file)
    #[arg(long, value_name = "CODE")]
    source_lang: Option<String>,

    /// Maximum concurrent model requests
    #[arg(long)]
    concurrency: Option<usize>,

    /// Write an example config file to PATH and exit
    #[arg(long, value_name = "PATH")]
    init_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let matches = Arguments::command()
        .after_help(env::help_text())
        .get_matches();
    let args = match Arguments::from_arg_matches(&matches) {
        Ok(args) => args,
        Err(e) => e.exit(),
    };

    if let Some(path) = &args.init_config {
        return match ConfigManager::generate_example_config(path) {
            Ok(()) => {
                println!("Wrote example config to {}", path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Arguments) -> TranslationResult<TranslationConfig> {
    let mut config = ConfigManager::load(args.config.as_deref())?.into_config();

    if let Some(root) = &args.pages_root {
        config.pages_root = root.to_string_lossy().into_owned();
    }
    if !args.langs.is_empty() {
        config.target_langs = args.langs.clone();
    }
    if let Some(lang) = &args.source_lang {
        config.source_lang = lang.clone();
    }
    if let Some(limit) = args.concurrency {
        config.max_concurrent_requests = limit;
    }

    config.validate()?;
    Ok(config)
}

async fn run(args: Arguments) -> TranslationResult<()> {
    let config = load_config(&args)?;
    let root = config.pages_root_dir();
    if !root.is_dir() {
        return Err(TranslationError::ConfigError(format!(
            "页面根目录不存在: {}",
            root.display()
        )));
    }
    let out = args.out.clone().unwrap_or_else(|| root.clone());

    let pages = collect_pages(&root, &config.target_langs);
    tracing::info!("在 {} 下找到 {} 个页面", root.display(), pages.len());

    let cache = Arc::new(FragmentCache::open(config.cache_file()).await);
    let client = OpenAiClient::new(&config)?;
    let translator = PageTranslator::new(config, client, Arc::clone(&cache))?;

    let mut written = 0usize;
    for path in &pages {
        let relative = relative_path(&root, path);
        let html = match tokio::fs::read(path).await {
            Ok(bytes) => decode_html(&bytes, "utf-8"),
            Err(e) => {
                tracing::warn!("读取页面失败，跳过 {}: {}", path.display(), e);
                continue;
            }
        };

        let page = RenderedPage::new(relative, html);
        let records = match translator.translate_page(&page).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("页面处理失败，跳过 {}: {}", page.path, e);
                continue;
            }
        };

        for record in records {
            let target = out.join(record.path.pathname.trim_start_matches('/'));
            if let Err(e) = write_page(&target, &record.html).await {
                tracing::warn!("写入失败，跳过 {}: {}", target.display(), e);
                continue;
            }
            tracing::debug!("写入 {}", target.display());
            written += 1;
        }
    }

    if let Err(e) = cache.close().await {
        tracing::warn!("关闭缓存失败: {}", e);
    }

    let stats = translator.stats();
    println!(
        "{} pages, {} files written, {} passes skipped, {} model calls ({} retries), {} cache hits",
        stats.pages_processed,
        written,
        stats.passes_skipped,
        stats.model_calls,
        stats.retries,
        stats.cache_hits
    );

    Ok(())
}

async fn write_page(target: &Path, html: &str) -> std::io::Result<()> {
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(target, html).await
}

/// 收集根目录下的 html 文件，跳过顶层的目标语言目录（上次运行的输出）
fn collect_pages(root: &Path, langs: &[String]) -> Vec<PathBuf> {
    let mut pages: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| {
            let is_lang_dir = entry.depth() == 1
                && entry.file_type().is_dir()
                && langs
                    .iter()
                    .any(|lang| entry.file_name().to_str() == Some(lang.as_str()));
            !is_lang_dir
        })
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("遍历目录出错: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .map_or(false, |ext| ext.eq_ignore_ascii_case("html"))
        })
        .map(|entry| entry.into_path())
        .collect();

    pages.sort();
    pages
}

fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
