//! 配置管理模块
//! 支持从环境变量和配置文件加载配置

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::btc_address::BitcoinNetwork;

pub const PRODUCTION_BASE_URL: &str = "https://did-api.geb.network";
pub const PREVIEW_BASE_URL: &str = "https://did-api-pre.geb.network";

/// 应用配置结构体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: DidApiConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 运行环境
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiEnvironment {
    Production,
    Staging,
    #[default]
    Development,
}

impl ApiEnvironment {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "staging" => Self::Staging,
            _ => Self::Development,
        }
    }

    /// 生产环境使用正式地址，其余环境统一使用预发布地址
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Production => PRODUCTION_BASE_URL,
            Self::Staging | Self::Development => PREVIEW_BASE_URL,
        }
    }
}

const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

/// DID API 配置
///
/// 配置文件未给出 base_url 时按 environment 推导
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "DidApiConfigFile")]
pub struct DidApiConfig {
    pub environment: ApiEnvironment,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Deserialize)]
struct DidApiConfigFile {
    #[serde(default)]
    environment: ApiEnvironment,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl From<DidApiConfigFile> for DidApiConfig {
    fn from(file: DidApiConfigFile) -> Self {
        Self {
            environment: file.environment,
            base_url: file
                .base_url
                .unwrap_or_else(|| file.environment.default_base_url().into()),
            timeout_secs: file.timeout_secs.unwrap_or(DEFAULT_API_TIMEOUT_SECS),
        }
    }
}

/// 钱包配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    pub preference_path: PathBuf,
    pub network: BitcoinNetwork,
}

/// 交易确认轮询配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub poll_interval_secs: u64,
    pub max_attempts: u32,
    /// 进入最终状态后延迟停止监控
    pub stop_delay_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
    pub enable_file_logging: bool,
    pub log_file_path: Option<String>,
}

impl Default for DidApiConfig {
    fn default() -> Self {
        let environment = std::env::var("DID_API_ENV")
            .map(|v| ApiEnvironment::parse(&v))
            .unwrap_or_default();
        Self {
            environment,
            base_url: std::env::var("DID_API_BASE_URL")
                .unwrap_or_else(|_| environment.default_base_url().into()),
            timeout_secs: std::env::var("DID_API_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_API_TIMEOUT_SECS),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            preference_path: std::env::var("WALLET_PREFERENCE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./.didcore/wallet.json")),
            network: std::env::var("BTC_NETWORK")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: std::env::var("TX_POLL_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
            max_attempts: std::env::var("TX_POLL_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(120),
            stop_delay_secs: 3,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
            enable_file_logging: std::env::var("LOG_FILE_ENABLED")
                .ok()
                .map(|v| v == "1")
                .unwrap_or(false),
            log_file_path: std::env::var("LOG_FILE_PATH").ok(),
        }
    }
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api: DidApiConfig::default(),
            wallet: WalletConfig::default(),
            monitor: MonitorConfig::default(),
            logging: LoggingConfig::default(),
        })
    }

    /// 从配置文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// 从环境变量和配置文件合并加载（配置文件优先级更高）
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut config = Self::from_env()?;

        if let Some(path) = path {
            if path.as_ref().exists() {
                config = Self::from_file(path)?;
            }
        }

        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            anyhow::bail!("DID_API_BASE_URL must start with http:// or https://");
        }

        if self.api.timeout_secs == 0 {
            anyhow::bail!("DID_API_TIMEOUT_SECS must be greater than 0");
        }

        if self.monitor.poll_interval_secs == 0 {
            anyhow::bail!("TX_POLL_INTERVAL_SECS must be greater than 0");
        }

        // 验证日志级别
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        // 验证日志格式
        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        Ok(())
    }
}
