// 命令行冒烟测试

use std::fs;
use std::process::Command;

use assert_cmd::prelude::*;
use tempfile::TempDir;

const ENV_VARS: &[&str] = &[
    "HTML_TRANSLATE_SOURCE_LANG",
    "HTML_TRANSLATE_TARGET_LANGS",
    "HTML_TRANSLATE_API_URL",
    "HTML_TRANSLATE_API_KEY",
    "OPENAI_API_KEY",
    "HTML_TRANSLATE_MODEL",
    "HTML_TRANSLATE_CHUNK_SIZE",
    "HTML_TRANSLATE_MAX_RETRIES",
    "HTML_TRANSLATE_CONCURRENCY",
    "HTML_TRANSLATE_CACHE_PATH",
];

/// 在隔离目录中运行，不受用户配置和环境变量影响
fn command(workdir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap();
    cmd.current_dir(workdir.path()).env("HOME", workdir.path());
    for name in ENV_VARS {
        cmd.env_remove(name);
    }
    cmd
}

#[test]
fn test_help() {
    let workdir = TempDir::new().unwrap();
    let out = command(&workdir).arg("--help").output().unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("--lang"));
    assert!(stdout.contains("--init-config"));
    assert!(stdout.contains("HTML_TRANSLATE_SOURCE_LANG"));
    assert!(stdout.contains("OPENAI_API_KEY"));
}

#[test]
fn test_missing_languages_fail_fast() {
    let workdir = TempDir::new().unwrap();
    let out = command(&workdir).arg(".").output().unwrap();

    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Error: 配置错误"));
}

#[test]
fn test_init_config_writes_loadable_file() {
    let workdir = TempDir::new().unwrap();
    let path = workdir.path().join("html-translate.toml");

    command(&workdir)
        .arg("--init-config")
        .arg(&path)
        .assert()
        .success();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("source_lang = \"en\""));

    // 生成的配置可以直接使用；页面根目录不存在时报错退出
    let out = command(&workdir)
        .arg("--config")
        .arg(&path)
        .arg("no-such-dir")
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("no-such-dir"));
}

#[test]
fn test_pages_without_text_are_copied() {
    let workdir = TempDir::new().unwrap();
    let site = workdir.path().join("site");
    fs::create_dir_all(site.join("docs")).unwrap();
    let html = "<!DOCTYPE html><html><head></head><body><img src=\"logo.png\"></body></html>";
    fs::write(site.join("docs").join("logo.html"), html).unwrap();
    fs::write(site.join("notes.txt"), "not a page").unwrap();

    let out = command(&workdir)
        .args(["--source-lang", "en", "--lang", "fr", "--lang", "de"])
        .arg(&site)
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    assert_eq!(fs::read_to_string(site.join("fr/docs/logo.html")).unwrap(), html);
    assert_eq!(fs::read_to_string(site.join("de/docs/logo.html")).unwrap(), html);
    assert!(!site.join("fr/notes.txt").exists());

    // 再次运行不会把上次的输出当作源页面
    let out = command(&workdir)
        .args(["--source-lang", "en", "--lang", "fr", "--lang", "de"])
        .arg(&site)
        .output()
        .unwrap();
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("1 pages, 2 files written"));
    assert!(!site.join("fr/fr").exists());
}

#[test]
fn test_unwritable_output_is_logged_and_skipped() {
    let workdir = TempDir::new().unwrap();
    let site = workdir.path().join("site");
    fs::create_dir_all(&site).unwrap();
    fs::write(site.join("logo.html"), "<html><body><img src=\"a.png\"></body></html>").unwrap();
    // 输出目录实际上是一个文件
    let out_file = workdir.path().join("out");
    fs::write(&out_file, "occupied").unwrap();

    let out = command(&workdir)
        .args(["--source-lang", "en", "--lang", "fr"])
        .arg("--out")
        .arg(&out_file)
        .arg(&site)
        .output()
        .unwrap();

    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(String::from_utf8_lossy(&out.stderr).contains("写入失败"));
    assert!(String::from_utf8_lossy(&out.stdout).contains("1 pages, 0 files written"));
    assert_eq!(fs::read_to_string(&out_file).unwrap(), "occupied");
}
