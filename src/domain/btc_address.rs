//! 比特币地址类型识别
//!
//! 按地址前缀判断类型；DID 控制地址要求为 Taproot (P2TR)

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 比特币网络
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BitcoinNetwork {
    Mainnet,
    Testnet,
    Signet,
}

impl BitcoinNetwork {
    pub fn is_mainnet(&self) -> bool {
        matches!(self, BitcoinNetwork::Mainnet)
    }

    /// Unisat switchChain 使用的链标识
    pub fn unisat_chain(&self) -> &'static str {
        match self {
            BitcoinNetwork::Mainnet => "BITCOIN_MAINNET",
            BitcoinNetwork::Testnet => "BITCOIN_TESTNET",
            BitcoinNetwork::Signet => "BITCOIN_SIGNET",
        }
    }

    /// OKX 等钱包 switchNetwork 使用的网络名
    pub fn wallet_network_name(&self) -> &'static str {
        match self {
            BitcoinNetwork::Mainnet => "livenet",
            BitcoinNetwork::Testnet => "testnet",
            BitcoinNetwork::Signet => "signet",
        }
    }
}

impl Default for BitcoinNetwork {
    fn default() -> Self {
        BitcoinNetwork::Testnet
    }
}

impl FromStr for BitcoinNetwork {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" | "livenet" | "bitcoin" => Ok(BitcoinNetwork::Mainnet),
            "testnet" => Ok(BitcoinNetwork::Testnet),
            "signet" => Ok(BitcoinNetwork::Signet),
            other => anyhow::bail!("Unsupported bitcoin network: {}", other),
        }
    }
}

/// 地址类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BtcAddressType {
    #[serde(rename = "Legacy")]
    Legacy,
    #[serde(rename = "Nested Segwit")]
    NestedSegwit,
    #[serde(rename = "Native Segwit")]
    NativeSegwit,
    #[serde(rename = "Taproot")]
    Taproot,
}

impl fmt::Display for BtcAddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BtcAddressType::Legacy => "Legacy",
            BtcAddressType::NestedSegwit => "Nested Segwit",
            BtcAddressType::NativeSegwit => "Native Segwit",
            BtcAddressType::Taproot => "Taproot",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("Address is Empty")]
    Empty,

    #[error("Only support Taproot address, current address type: {}. Please switch to Taproot address in your wallet.", .detected.map(|t| t.to_string()).unwrap_or_else(|| "unknown".into()))]
    NotTaproot { detected: Option<BtcAddressType> },
}

/// 主网地址类型
pub fn detect_btc_address(address: &str) -> Option<BtcAddressType> {
    if address.starts_with('1') {
        Some(BtcAddressType::Legacy)
    } else if address.starts_with('3') {
        Some(BtcAddressType::NestedSegwit)
    } else if address.starts_with("bc1p") {
        Some(BtcAddressType::Taproot)
    } else if address.starts_with("bc1q") {
        Some(BtcAddressType::NativeSegwit)
    } else {
        None
    }
}

/// 测试网 / signet 地址类型
pub fn detect_testnet_btc_address(address: &str) -> Option<BtcAddressType> {
    if address.starts_with('m') || address.starts_with('n') {
        Some(BtcAddressType::Legacy)
    } else if address.starts_with('2') {
        Some(BtcAddressType::NestedSegwit)
    } else if address.starts_with("tb1p") {
        Some(BtcAddressType::Taproot)
    } else if address.starts_with("tb1q") {
        Some(BtcAddressType::NativeSegwit)
    } else {
        None
    }
}

pub fn detect_for_network(address: &str, network: BitcoinNetwork) -> Option<BtcAddressType> {
    if network.is_mainnet() {
        detect_btc_address(address)
    } else {
        detect_testnet_btc_address(address)
    }
}

/// 校验地址为 Taproot 类型
pub fn validate_taproot_address(
    address: &str,
    network: BitcoinNetwork,
) -> Result<BtcAddressType, AddressError> {
    if address.is_empty() {
        return Err(AddressError::Empty);
    }

    match detect_for_network(address, network) {
        Some(BtcAddressType::Taproot) => Ok(BtcAddressType::Taproot),
        detected => {
            tracing::debug!(?detected, ?network, "Rejected non-taproot control address");
            Err(AddressError::NotTaproot { detected })
        }
    }
}
