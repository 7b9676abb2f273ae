//! 密钥类型模块
//!
//! 定义支持的公钥算法及其 2 字节 multicodec 前缀（与链端保持一致）

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// 公钥算法类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    /// secp256k1 (Bitcoin 钱包默认)
    #[serde(rename = "secp256k1")]
    Secp256k1,
    #[serde(rename = "ed25519")]
    Ed25519,
    /// NIST P-256
    #[serde(rename = "p256")]
    P256,
    /// NIST P-384
    #[serde(rename = "p384")]
    P384,
    #[serde(rename = "bls12-381")]
    Bls12381,
    /// 国密 SM2
    #[serde(rename = "sm2")]
    Sm2,
}

/// 前缀表：(类型, 16位前缀)
const PREFIX_TABLE: [(KeyType, u16); 6] = [
    (KeyType::Ed25519, 0xED01),
    (KeyType::Secp256k1, 0xE701),
    (KeyType::P256, 0x8024),
    (KeyType::P384, 0x8124),
    (KeyType::Bls12381, 0xEB01),
    (KeyType::Sm2, 0x8624),
];

impl KeyType {
    pub const ALL: [KeyType; 6] = [
        KeyType::Secp256k1,
        KeyType::Ed25519,
        KeyType::P256,
        KeyType::P384,
        KeyType::Bls12381,
        KeyType::Sm2,
    ];

    /// 16位 multicodec 前缀
    pub fn prefix(&self) -> u16 {
        PREFIX_TABLE
            .iter()
            .find(|(kt, _)| kt == self)
            .map(|(_, prefix)| *prefix)
            .unwrap_or_default()
    }

    /// 前缀按大端拆分为两个字节
    pub fn prefix_bytes(&self) -> [u8; 2] {
        self.prefix().to_be_bytes()
    }

    /// 按前缀反查密钥类型
    pub fn from_prefix(prefix: u16) -> Option<Self> {
        PREFIX_TABLE
            .iter()
            .find(|(_, p)| *p == prefix)
            .map(|(kt, _)| *kt)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Secp256k1 => "secp256k1",
            KeyType::Ed25519 => "ed25519",
            KeyType::P256 => "p256",
            KeyType::P384 => "p384",
            KeyType::Bls12381 => "bls12-381",
            KeyType::Sm2 => "sm2",
        }
    }

    /// 展示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            KeyType::Secp256k1 => "Secp256k1 (Bitcoin)",
            KeyType::Ed25519 => "Ed25519",
            KeyType::P256 => "P-256",
            KeyType::P384 => "P-384",
            KeyType::Bls12381 => "BLS12-381",
            KeyType::Sm2 => "SM2",
        }
    }
}

impl Default for KeyType {
    fn default() -> Self {
        KeyType::Secp256k1
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyType::ALL
            .iter()
            .find(|kt| kt.as_str() == s)
            .copied()
            .ok_or_else(|| CodecError::UnsupportedKeyType(s.to_string()))
    }
}
