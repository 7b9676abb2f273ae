//! 浏览器比特币钱包接入
//!
//! 钱包插件通过 [`WalletTransport`] 注入；连接时一次性协商 [`WalletCapability`]，
//! 之后所有调用按协商结果映射方法名

use std::{fmt, str::FromStr};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::WalletError;

pub mod manager;

pub use manager::{WalletManager, WalletState};

/// 支持的钱包
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletKind {
    Okx,
    Unisat,
}

impl WalletKind {
    pub const ALL: [WalletKind; 2] = [WalletKind::Okx, WalletKind::Unisat];

    pub fn as_str(&self) -> &'static str {
        match self {
            WalletKind::Okx => "okx",
            WalletKind::Unisat => "unisat",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            WalletKind::Okx => "OKX Wallet",
            WalletKind::Unisat => "Unisat Wallet",
        }
    }

    pub fn install_url(&self) -> &'static str {
        match self {
            WalletKind::Okx => "https://www.okx.com/web3",
            WalletKind::Unisat => "https://unisat.io",
        }
    }
}

impl fmt::Display for WalletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WalletKind {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "okx" => Ok(WalletKind::Okx),
            "unisat" => Ok(WalletKind::Unisat),
            other => Err(WalletError::UnknownWalletType(other.to_string())),
        }
    }
}

/// 钱包注入对象暴露的接口面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProviderSurface {
    /// 比特币专用 API（`okxwallet.bitcoin.*` / `unisat.*`）
    pub bitcoin_namespace: bool,
    /// 通用 `request({ method, params })`
    pub generic_request: bool,
}

/// 协商出的调用方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletCapability {
    BitcoinNamespace,
    GenericRequest,
    Unsupported,
}

/// 钱包操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletMethod {
    RequestAccounts,
    GetPublicKey,
    GetBalance,
    GetNetwork,
    SwitchNetwork,
    SignPsbt,
    SignMessage,
}

impl WalletCapability {
    /// 专用 API 优先
    pub fn negotiate(surface: ProviderSurface) -> Self {
        if surface.bitcoin_namespace {
            WalletCapability::BitcoinNamespace
        } else if surface.generic_request {
            WalletCapability::GenericRequest
        } else {
            WalletCapability::Unsupported
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, WalletCapability::Unsupported)
    }

    /// 协商结果下的方法名
    pub fn method_name(&self, kind: WalletKind, method: WalletMethod) -> Option<&'static str> {
        use WalletMethod::*;

        let name = match self {
            WalletCapability::BitcoinNamespace => match method {
                RequestAccounts => "requestAccounts",
                GetPublicKey => "getPublicKey",
                GetBalance => "getBalance",
                GetNetwork => "getNetwork",
                SwitchNetwork if kind == WalletKind::Unisat => "switchChain",
                SwitchNetwork => "switchNetwork",
                SignPsbt => "signPsbt",
                SignMessage => "signMessage",
            },
            WalletCapability::GenericRequest => match method {
                RequestAccounts => "bitcoin_requestAccounts",
                GetPublicKey => "bitcoin_getPublicKey",
                GetBalance => "bitcoin_getBalance",
                GetNetwork => "bitcoin_getNetwork",
                SwitchNetwork => "wallet_switchBitcoinNetwork",
                SignPsbt => "bitcoin_signPsbt",
                SignMessage => "bitcoin_signMessage",
            },
            WalletCapability::Unsupported => return None,
        };
        Some(name)
    }
}

/// 钱包插件传输层
#[async_trait]
pub trait WalletTransport: Send + Sync {
    fn kind(&self) -> WalletKind;

    fn is_installed(&self) -> bool;

    fn surface(&self) -> ProviderSurface;

    /// 调用钱包方法，`params` 为位置参数数组
    async fn call(
        &self,
        capability: WalletCapability,
        method: &str,
        params: Value,
    ) -> Result<Value, WalletError>;
}

/// 账户列表取第一个地址（兼容字符串与 `{ address }` 对象）
pub(crate) fn first_account(method: &str, value: &Value) -> Result<Option<String>, WalletError> {
    let accounts = value.as_array().ok_or_else(|| WalletError::MalformedResponse {
        method: method.to_string(),
        message: "expected an array of accounts".into(),
    })?;

    Ok(accounts.first().and_then(|entry| match entry {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => obj.get("address").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }))
}

/// 余额（聪），兼容数字与 `{ confirmed, unconfirmed, total }`
pub(crate) fn parse_balance(method: &str, value: &Value) -> Result<u64, WalletError> {
    let amount = match value {
        Value::Object(obj) => obj.get("total").and_then(Value::as_u64),
        other => other.as_u64(),
    };
    amount.ok_or_else(|| WalletError::MalformedResponse {
        method: method.to_string(),
        message: format!("unexpected balance payload: {}", value),
    })
}

pub(crate) fn expect_string(method: &str, value: Value) -> Result<String, WalletError> {
    match value {
        Value::String(s) if !s.is_empty() => Ok(s),
        other => Err(WalletError::MalformedResponse {
            method: method.to_string(),
            message: format!("expected a non-empty string, got {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_negotiate() {
        let both = ProviderSurface {
            bitcoin_namespace: true,
            generic_request: true,
        };
        assert_eq!(WalletCapability::negotiate(both), WalletCapability::BitcoinNamespace);

        let generic = ProviderSurface {
            bitcoin_namespace: false,
            generic_request: true,
        };
        assert_eq!(WalletCapability::negotiate(generic), WalletCapability::GenericRequest);

        assert_eq!(
            WalletCapability::negotiate(ProviderSurface::default()),
            WalletCapability::Unsupported
        );
    }

    #[test]
    fn test_method_mapping() {
        let ns = WalletCapability::BitcoinNamespace;
        assert_eq!(
            ns.method_name(WalletKind::Okx, WalletMethod::SwitchNetwork),
            Some("switchNetwork")
        );
        assert_eq!(
            ns.method_name(WalletKind::Unisat, WalletMethod::SwitchNetwork),
            Some("switchChain")
        );
        assert_eq!(
            WalletCapability::GenericRequest.method_name(WalletKind::Okx, WalletMethod::RequestAccounts),
            Some("bitcoin_requestAccounts")
        );
        assert_eq!(
            WalletCapability::Unsupported.method_name(WalletKind::Okx, WalletMethod::SignPsbt),
            None
        );
    }

    #[test]
    fn test_wallet_kind_parse() {
        assert_eq!("OKX".parse::<WalletKind>().unwrap(), WalletKind::Okx);
        assert_eq!("unisat".parse::<WalletKind>().unwrap(), WalletKind::Unisat);
        assert_eq!(
            "metamask".parse::<WalletKind>(),
            Err(WalletError::UnknownWalletType("metamask".into()))
        );
    }

    #[test]
    fn test_response_parsing() {
        assert_eq!(
            first_account("requestAccounts", &json!(["tb1pabc"])).unwrap(),
            Some("tb1pabc".to_string())
        );
        assert_eq!(
            first_account("requestAccounts", &json!([{ "address": "tb1pdef" }])).unwrap(),
            Some("tb1pdef".to_string())
        );
        assert_eq!(first_account("requestAccounts", &json!([])).unwrap(), None);
        assert!(first_account("requestAccounts", &json!("tb1p")).is_err());

        assert_eq!(parse_balance("getBalance", &json!(12345)).unwrap(), 12345);
        assert_eq!(
            parse_balance("getBalance", &json!({ "confirmed": 1, "unconfirmed": 2, "total": 3 }))
                .unwrap(),
            3
        );
        assert!(expect_string("signPsbt", json!(null)).is_err());
    }
}
