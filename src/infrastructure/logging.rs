//! 日志系统配置模块
//! 支持结构化日志、日志级别配置和按天滚动的文件日志

use std::path::Path;

use anyhow::Result;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

use crate::config::LoggingConfig;

const LOG_FILE_PREFIX: &str = "didcore.log";

/// 初始化日志系统
///
/// 启用文件日志时返回写入线程的 guard，调用方需持有到进程退出
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    // RUST_LOG 优先
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.format == "json" {
        init_json_logging(filter, config)
    } else {
        init_text_logging(filter, config)
    }
}

fn log_dir(config: &LoggingConfig) -> &Path {
    config
        .log_file_path
        .as_ref()
        .and_then(|p| Path::new(p).parent())
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("./logs"))
}

/// 初始化JSON格式日志（结构化日志）
fn init_json_logging(filter: EnvFilter, config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    if !config.enable_file_logging {
        let stdout_layer = fmt::layer().json().with_timer(ChronoUtc::rfc_3339());
        Registry::default().with(filter).with(stdout_layer).try_init()?;
        return Ok(None);
    }

    let dir = log_dir(config);
    std::fs::create_dir_all(dir)?;
    let (writer, guard) = non_blocking(rolling::daily(dir, LOG_FILE_PREFIX));

    let file_layer = fmt::layer()
        .json()
        .with_writer(writer)
        .with_timer(ChronoUtc::rfc_3339());
    let stdout_layer = fmt::layer().json().with_timer(ChronoUtc::rfc_3339());

    Registry::default()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()?;

    Ok(Some(guard))
}

/// 初始化文本格式日志
fn init_text_logging(filter: EnvFilter, config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    if !config.enable_file_logging {
        let stdout_layer = fmt::layer()
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(true);
        Registry::default().with(filter).with(stdout_layer).try_init()?;
        return Ok(None);
    }

    let dir = log_dir(config);
    std::fs::create_dir_all(dir)?;
    let (writer, guard) = non_blocking(rolling::daily(dir, LOG_FILE_PREFIX));

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_timer(ChronoUtc::rfc_3339())
        .with_ansi(false);
    let stdout_layer = fmt::layer()
        .with_timer(ChronoUtc::rfc_3339())
        .with_ansi(true);

    Registry::default()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()?;

    Ok(Some(guard))
}

/// 简化初始化（使用默认配置）
pub fn init_default_logging() -> Option<WorkerGuard> {
    let config = LoggingConfig::default();
    init_logging(&config).unwrap_or_else(|e| {
        eprintln!("Failed to initialize logging: {}", e);
        // 回退到最基本的日志初始化
        let _ = tracing_subscriber::fmt().try_init();
        None
    })
}
