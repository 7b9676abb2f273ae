//! 公钥类型检测与校验
//!
//! 钱包来源均为 Bitcoin 风格的 secp256k1 公钥，检测失败时统一回退到 secp256k1。
//! 注意：32 字节公钥无法仅凭长度区分 secp256k1 x-only 与 Ed25519，这里固定判为 secp256k1。

use crate::{domain::key_type::KeyType, utils::string_utils::strip_hex_prefix};

/// 32 字节（x-only）
const XONLY_HEX_LEN: usize = 64;
/// 33 字节（压缩，02/03 前缀）
const COMPRESSED_HEX_LEN: usize = 66;
/// 65 字节（未压缩，04 前缀）
const UNCOMPRESSED_HEX_LEN: usize = 130;

/// 检测公钥类型（总是返回一个类型）
pub fn detect_key_type(public_key: &str) -> KeyType {
    let clean_key = strip_hex_prefix(public_key);

    match clean_key.len() {
        // 前导字节不是 02/03/04 时同样按 secp256k1 处理
        XONLY_HEX_LEN | COMPRESSED_HEX_LEN | UNCOMPRESSED_HEX_LEN => KeyType::Secp256k1,
        len if len >= 4 => clean_key
            .get(..4)
            .and_then(|head| u16::from_str_radix(head, 16).ok())
            .and_then(KeyType::from_prefix)
            .unwrap_or_default(),
        _ => KeyType::default(),
    }
}

/// 校验公钥格式；`expected` 给定时要求检测结果一致
pub fn is_valid_public_key(public_key: &str, expected: Option<KeyType>) -> bool {
    let clean_key = strip_hex_prefix(public_key);

    if clean_key.is_empty() || !clean_key.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }

    let detected = detect_key_type(public_key);
    if let Some(expected) = expected {
        if detected != expected {
            return false;
        }
    }

    match detected {
        KeyType::Secp256k1 => matches!(
            clean_key.len(),
            XONLY_HEX_LEN | COMPRESSED_HEX_LEN | UNCOMPRESSED_HEX_LEN
        ),
        KeyType::Ed25519 => clean_key.len() == XONLY_HEX_LEN,
        KeyType::P256 | KeyType::P384 | KeyType::Bls12381 | KeyType::Sm2 => true,
    }
}
