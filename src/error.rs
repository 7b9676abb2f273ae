//! 错误定义模块
//!
//! 分层错误：编解码错误（CodecError）、钱包错误（WalletError）、DID API 错误（DidApiError），
//! 业务层统一转换为 AppError 供调用方展示

use serde::Serialize;
use thiserror::Error;

/// 编解码错误（同步、确定性的输入格式错误，不可重试）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Invalid hex format: {0}")]
    InvalidHexFormat(String),

    #[error("Invalid hex byte: {0}")]
    InvalidHexByte(String),

    #[error("Invalid base64 format: {0}")]
    InvalidBase64Format(String),

    #[error("Invalid multibase key format: {0}")]
    InvalidMultibaseFormat(String),

    #[error("Unsupported key type: {0}")]
    UnsupportedKeyType(String),
}

/// 钱包扩展错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("{0} wallet is not installed")]
    NotInstalled(String),

    #[error("{0} wallet exposes no supported bitcoin API")]
    Unsupported(String),

    #[error("Unsupported wallet type: {0}")]
    UnknownWalletType(String),

    #[error("Wallet not connected")]
    NotConnected,

    #[error("No accounts found or user rejected the connection")]
    NoAccounts,

    #[error("Wallet call {method} failed: {message}")]
    CallFailed { method: String, message: String },

    #[error("Unexpected wallet response for {method}: {message}")]
    MalformedResponse { method: String, message: String },
}

/// DID API 调用错误
#[derive(Debug, Error)]
pub enum DidApiError {
    #[error("network error, please try again later: {0}")]
    Network(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to decode API response: {0}")]
    Decode(String),

    #[error("API rejected request: {0}")]
    Api(String),
}

impl From<reqwest::Error> for DidApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            Self::Network(err.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppErrorCode {
    // 格式错误
    InvalidHexFormat,
    InvalidBase64Format,
    InvalidMultibaseFormat,
    UnsupportedKeyType,
    InvalidPublicKey,
    InvalidPsbt,
    InvalidAddress,
    InvalidParameter,

    // 钱包错误
    WalletNotInstalled,
    WalletUnsupported,
    WalletNotConnected,
    WalletRejected,
    WalletError,

    // 远程服务错误
    Network,
    Timeout,
    ExternalServiceError,
    TransactionFailed,

    Internal,
}

impl AppErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppErrorCode::InvalidHexFormat => "invalid_hex_format",
            AppErrorCode::InvalidBase64Format => "invalid_base64_format",
            AppErrorCode::InvalidMultibaseFormat => "invalid_multibase_format",
            AppErrorCode::UnsupportedKeyType => "unsupported_key_type",
            AppErrorCode::InvalidPublicKey => "invalid_public_key",
            AppErrorCode::InvalidPsbt => "invalid_psbt",
            AppErrorCode::InvalidAddress => "invalid_address",
            AppErrorCode::InvalidParameter => "invalid_parameter",
            AppErrorCode::WalletNotInstalled => "wallet_not_installed",
            AppErrorCode::WalletUnsupported => "wallet_unsupported",
            AppErrorCode::WalletNotConnected => "wallet_not_connected",
            AppErrorCode::WalletRejected => "wallet_rejected",
            AppErrorCode::WalletError => "wallet_error",
            AppErrorCode::Network => "network",
            AppErrorCode::Timeout => "timeout",
            AppErrorCode::ExternalServiceError => "external_service_error",
            AppErrorCode::TransactionFailed => "transaction_failed",
            AppErrorCode::Internal => "internal",
        }
    }
}

/// 业务层统一错误
#[derive(Debug, Clone, Error)]
#[error("[{}] {message}", .code.as_str())]
pub struct AppError {
    pub code: AppErrorCode,
    pub message: String,
    pub trace_id: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
    trace_id: Option<&'a str>,
}

impl AppError {
    pub fn new(code: AppErrorCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
            trace_id: None,
        }
    }

    pub fn invalid_public_key(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::InvalidPublicKey, msg)
    }

    pub fn invalid_psbt(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::InvalidPsbt, msg)
    }

    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::InvalidAddress, msg)
    }

    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::InvalidParameter, msg)
    }

    pub fn wallet_not_connected() -> Self {
        Self::new(AppErrorCode::WalletNotConnected, "Wallet not connected")
    }

    pub fn transaction_failed(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::TransactionFailed, msg)
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::Timeout, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::Internal, msg)
    }

    /// 设置追踪ID
    pub fn with_trace_id(mut self, trace_id: String) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// 面向用户的提示文案（未映射的错误码回退到原始消息）
    pub fn user_message(&self) -> String {
        crate::error_map::user_message(self.code)
            .map(str::to_string)
            .unwrap_or_else(|| self.message.clone())
    }

    /// 序列化为 JSON 错误体
    pub fn to_json(&self) -> serde_json::Value {
        let body = ErrorBody {
            code: self.code.as_str(),
            message: &self.message,
            trace_id: self.trace_id.as_deref(),
        };
        serde_json::to_value(body).unwrap_or(serde_json::Value::Null)
    }
}

impl From<CodecError> for AppError {
    fn from(err: CodecError) -> Self {
        let code = match err {
            CodecError::InvalidHexFormat(_) | CodecError::InvalidHexByte(_) => {
                AppErrorCode::InvalidHexFormat
            }
            CodecError::InvalidBase64Format(_) => AppErrorCode::InvalidBase64Format,
            CodecError::InvalidMultibaseFormat(_) => AppErrorCode::InvalidMultibaseFormat,
            CodecError::UnsupportedKeyType(_) => AppErrorCode::UnsupportedKeyType,
        };
        Self::new(code, err.to_string())
    }
}

impl From<WalletError> for AppError {
    fn from(err: WalletError) -> Self {
        let code = match err {
            WalletError::NotInstalled(_) => AppErrorCode::WalletNotInstalled,
            WalletError::Unsupported(_) | WalletError::UnknownWalletType(_) => {
                AppErrorCode::WalletUnsupported
            }
            WalletError::NotConnected => AppErrorCode::WalletNotConnected,
            WalletError::NoAccounts => AppErrorCode::WalletRejected,
            WalletError::CallFailed { .. } | WalletError::MalformedResponse { .. } => {
                AppErrorCode::WalletError
            }
        };
        Self::new(code, err.to_string())
    }
}

impl From<DidApiError> for AppError {
    fn from(err: DidApiError) -> Self {
        let code = match err {
            DidApiError::Network(_) => AppErrorCode::Network,
            DidApiError::Timeout(_) => AppErrorCode::Timeout,
            DidApiError::Status { .. } | DidApiError::Decode(_) | DidApiError::Api(_) => {
                AppErrorCode::ExternalServiceError
            }
        };
        Self::new(code, err.to_string())
    }
}

impl From<crate::domain::btc_address::AddressError> for AppError {
    fn from(err: crate::domain::btc_address::AddressError) -> Self {
        Self::invalid_address(err.to_string())
    }
}

// 从 serde_json 错误转换
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(format!("JSON serialization error: {}", err))
    }
}

// 从 anyhow 错误转换
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(format!("{}", err))
    }
}
