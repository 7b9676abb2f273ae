//! 公钥 multibase 编解码
//!
//! 编码格式：'z' + base58btc([前缀高字节, 前缀低字节, ...公钥字节])

use serde::Serialize;

use crate::{domain::key_type::KeyType, error::CodecError, utils::string_utils::strip_hex_prefix};

/// multibase 中 base58btc 的前缀字符
pub const BASE58BTC_PREFIX: char = 'z';

/// 解码结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedPublicKey {
    /// 小写十六进制公钥
    pub public_key_hex: String,
    /// 前缀未登记时为 None
    pub key_type: Option<KeyType>,
    /// 大写十六进制前缀（诊断用）
    pub prefix: String,
}

impl DecodedPublicKey {
    pub fn key_type_name(&self) -> &'static str {
        self.key_type.map(|kt| kt.as_str()).unwrap_or("unknown")
    }
}

/// 将十六进制公钥编码为 multibase 格式
pub fn encode_public_key(public_key_hex: &str, key_type: KeyType) -> Result<String, CodecError> {
    let clean_hex = strip_hex_prefix(public_key_hex).to_lowercase();

    if clean_hex.is_empty() || !clean_hex.chars().all(|c| c.is_ascii_hexdigit()) {
        tracing::debug!(len = clean_hex.len(), "Rejected non-hex public key");
        return Err(CodecError::InvalidHexFormat(
            "public key must contain only hex characters".into(),
        ));
    }
    if clean_hex.len() % 2 != 0 {
        return Err(CodecError::InvalidHexFormat(
            "public key must have an even number of hex characters".into(),
        ));
    }

    let key_bytes =
        hex::decode(&clean_hex).map_err(|e| CodecError::InvalidHexByte(e.to_string()))?;

    let mut encoded = Vec::with_capacity(2 + key_bytes.len());
    encoded.extend_from_slice(&key_type.prefix_bytes());
    encoded.extend_from_slice(&key_bytes);

    Ok(format!(
        "{}{}",
        BASE58BTC_PREFIX,
        bs58::encode(encoded).into_string()
    ))
}

/// 按字符串指定的密钥类型编码（类型名不在前缀表中时返回 UnsupportedKeyType）
pub fn encode_public_key_with_type_name(
    public_key_hex: &str,
    key_type: &str,
) -> Result<String, CodecError> {
    let key_type: KeyType = key_type.parse()?;
    encode_public_key(public_key_hex, key_type)
}

/// 从 multibase 格式解码公钥
pub fn decode_public_key(multibase_key: &str) -> Result<DecodedPublicKey, CodecError> {
    let Some(base58_part) = multibase_key.strip_prefix(BASE58BTC_PREFIX) else {
        return Err(CodecError::InvalidMultibaseFormat(
            "must start with z".into(),
        ));
    };

    let decoded = bs58::decode(base58_part)
        .into_vec()
        .map_err(|e| CodecError::InvalidMultibaseFormat(e.to_string()))?;

    if decoded.len() < 2 {
        return Err(CodecError::InvalidMultibaseFormat("too short".into()));
    }

    let prefix = u16::from_be_bytes([decoded[0], decoded[1]]);

    Ok(DecodedPublicKey {
        public_key_hex: hex::encode(&decoded[2..]),
        key_type: KeyType::from_prefix(prefix),
        prefix: format!("{:X}", prefix),
    })
}

/// 校验 multibase 公钥格式（不抛错）
pub fn is_valid_multibase_key(multibase_key: &str) -> bool {
    decode_public_key(multibase_key).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPRESSED_KEY: &str =
        "03a34b99f22c790c4e36b2b3c2c35a36db06226e41c692fc82b8b56ac1c540c5bd";

    #[test]
    fn test_encode_decode_compressed_secp256k1() {
        let encoded = encode_public_key(COMPRESSED_KEY, KeyType::Secp256k1).unwrap();
        assert!(encoded.starts_with('z'));

        let decoded = decode_public_key(&encoded).unwrap();
        assert_eq!(decoded.key_type, Some(KeyType::Secp256k1));
        assert_eq!(decoded.public_key_hex, COMPRESSED_KEY);
        assert_eq!(decoded.prefix, "E701");
    }

    #[test]
    fn test_encode_accepts_0x_and_uppercase() {
        let upper = format!("0x{}", COMPRESSED_KEY.to_uppercase());
        let a = encode_public_key(&upper, KeyType::Secp256k1).unwrap();
        let b = encode_public_key(COMPRESSED_KEY, KeyType::Secp256k1).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_encode_prefix_bytes_precede_key() {
        let encoded = encode_public_key("0102", KeyType::Ed25519).unwrap();
        let raw = bs58::decode(&encoded[1..]).into_vec().unwrap();
        assert_eq!(raw, vec![0xED, 0x01, 0x01, 0x02]);
    }

    #[test]
    fn test_encode_rejects_bad_hex() {
        assert!(matches!(
            encode_public_key("zz", KeyType::Secp256k1),
            Err(CodecError::InvalidHexFormat(_))
        ));
        assert!(matches!(
            encode_public_key("", KeyType::Secp256k1),
            Err(CodecError::InvalidHexFormat(_))
        ));
        assert!(matches!(
            encode_public_key("abc", KeyType::Secp256k1),
            Err(CodecError::InvalidHexFormat(_))
        ));
    }

    #[test]
    fn test_encode_unknown_type_name() {
        assert!(matches!(
            encode_public_key_with_type_name(COMPRESSED_KEY, "rsa"),
            Err(CodecError::UnsupportedKeyType(_))
        ));
    }

    #[test]
    fn test_decode_failures() {
        assert!(matches!(
            decode_public_key("notz"),
            Err(CodecError::InvalidMultibaseFormat(_))
        ));
        assert!(matches!(
            decode_public_key("z0OIl"),
            Err(CodecError::InvalidMultibaseFormat(_))
        ));
        // 单字节载荷
        let one_byte = format!("z{}", bs58::encode([0xE7u8]).into_string());
        assert!(matches!(
            decode_public_key(&one_byte),
            Err(CodecError::InvalidMultibaseFormat(_))
        ));
    }

    #[test]
    fn test_decode_unknown_prefix() {
        let raw = [0x00u8, 0x12, 0xAA];
        let key = format!("z{}", bs58::encode(raw).into_string());
        let decoded = decode_public_key(&key).unwrap();
        assert_eq!(decoded.key_type, None);
        assert_eq!(decoded.key_type_name(), "unknown");
        assert_eq!(decoded.prefix, "12");
        assert_eq!(decoded.public_key_hex, "aa");
    }

    #[test]
    fn test_prefix_only_payload_decodes_empty_key() {
        let key = format!("z{}", bs58::encode([0xE7u8, 0x01]).into_string());
        let decoded = decode_public_key(&key).unwrap();
        assert_eq!(decoded.public_key_hex, "");
        assert_eq!(decoded.key_type, Some(KeyType::Secp256k1));
    }

    #[test]
    fn test_is_valid_multibase_key() {
        assert!(!is_valid_multibase_key("znotbase58!!"));
        assert!(!is_valid_multibase_key(""));
        let encoded = encode_public_key(COMPRESSED_KEY, KeyType::P384).unwrap();
        assert!(is_valid_multibase_key(&encoded));
    }
}
