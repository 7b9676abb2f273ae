//! PSBT 十六进制 / Base64 转换
//!
//! 钱包插件签名时使用 hex，DID API 收发 base64，字节序列是规范形式

use base64::{
    alphabet,
    engine::{general_purpose::GeneralPurpose, DecodePaddingMode, GeneralPurposeConfig},
    Engine,
};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{error::CodecError, utils::string_utils::strip_hex_prefix};

/// 解码时容忍缺失的填充（与浏览器 atob 行为一致），编码输出标准填充
const PSBT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

static BASE64_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9+/]*={0,2}$").expect("static regex"));
static HEX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-fA-F]+$").expect("static regex"));
static PSBT_BASE64_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9+/]*(=|==)?$").expect("static regex"));

/// PSBT 字符串的表层编码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PsbtEncoding {
    Hex,
    Base64,
    Invalid,
}

impl PsbtEncoding {
    /// 两种格式都匹配时（纯十六进制字符）优先判为 hex
    ///
    /// 忽略首尾空白；带 0x 前缀且其余部分为十六进制时判为 hex
    pub fn detect(psbt: &str) -> Self {
        let trimmed = psbt.trim();
        let unprefixed = strip_hex_prefix(trimmed);
        if unprefixed.is_empty() {
            PsbtEncoding::Invalid
        } else if HEX_RE.is_match(unprefixed) {
            PsbtEncoding::Hex
        } else if PSBT_BASE64_RE.is_match(trimmed) {
            PsbtEncoding::Base64
        } else {
            PsbtEncoding::Invalid
        }
    }
}

/// 去掉空白与 0x 前缀并转小写，校验字符集与偶数长度
fn normalize_hex(hex_str: &str) -> Result<String, CodecError> {
    let clean = strip_hex_prefix(hex_str.trim()).to_lowercase();

    if !clean.chars().all(|c| c.is_ascii_hexdigit()) {
        tracing::debug!(len = clean.len(), "Rejected non-hex PSBT payload");
        return Err(CodecError::InvalidHexFormat(
            "only 0-9 and a-f characters allowed".into(),
        ));
    }
    if clean.len() % 2 != 0 {
        return Err(CodecError::InvalidHexFormat(
            "must have an even number of characters".into(),
        ));
    }

    Ok(clean)
}

/// Base64 转 Hex（小写）
pub fn base64_to_hex(base64_str: &str) -> Result<String, CodecError> {
    let clean = base64_str.trim();

    if !BASE64_RE.is_match(clean) {
        tracing::debug!(len = clean.len(), "Rejected non-base64 PSBT payload");
        return Err(CodecError::InvalidBase64Format(
            "only A-Z, a-z, 0-9, + and / with optional = padding allowed".into(),
        ));
    }

    let bytes = PSBT_BASE64
        .decode(clean)
        .map_err(|e| CodecError::InvalidBase64Format(e.to_string()))?;

    Ok(hex::encode(bytes))
}

/// Hex 转 Base64
pub fn hex_to_base64(hex_str: &str) -> Result<String, CodecError> {
    let clean = normalize_hex(hex_str)?;
    let bytes = hex::decode(&clean).map_err(|e| CodecError::InvalidHexByte(e.to_string()))?;

    Ok(PSBT_BASE64.encode(bytes))
}

/// 语法层面的 PSBT 格式校验（hex 或 base64），不解析 PSBT 结构
pub fn is_valid_psbt(psbt: &str) -> bool {
    PsbtEncoding::detect(psbt) != PsbtEncoding::Invalid
}

/// 规范化为钱包签名所需的 hex
pub fn to_wallet_hex(psbt: &str) -> Result<String, CodecError> {
    match PsbtEncoding::detect(psbt) {
        PsbtEncoding::Hex => normalize_hex(psbt),
        PsbtEncoding::Base64 => base64_to_hex(psbt),
        PsbtEncoding::Invalid => Err(CodecError::InvalidBase64Format(
            "PSBT is neither hex nor base64".into(),
        )),
    }
}

/// 规范化为 DID API 所需的 base64
pub fn to_api_base64(psbt: &str) -> Result<String, CodecError> {
    match PsbtEncoding::detect(psbt) {
        PsbtEncoding::Hex => hex_to_base64(psbt),
        // 经字节重新编码，输出标准填充
        PsbtEncoding::Base64 => hex_to_base64(&base64_to_hex(psbt)?),
        PsbtEncoding::Invalid => Err(CodecError::InvalidBase64Format(
            "PSBT is neither hex nor base64".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        assert_eq!(hex_to_base64("deadbeef").unwrap(), "3q2+7w==");
        assert_eq!(base64_to_hex("3q2+7w==").unwrap(), "deadbeef");
    }

    #[test]
    fn test_hex_normalization() {
        assert_eq!(hex_to_base64("  0xDEADBEEF \n").unwrap(), "3q2+7w==");
        assert_eq!(hex_to_base64("").unwrap(), "");
    }

    #[test]
    fn test_hex_errors() {
        assert!(matches!(
            hex_to_base64("abc"),
            Err(CodecError::InvalidHexFormat(_))
        ));
        assert!(matches!(
            hex_to_base64("gg"),
            Err(CodecError::InvalidHexFormat(_))
        ));
    }

    #[test]
    fn test_base64_errors() {
        assert!(matches!(
            base64_to_hex("3q2+7w==!"),
            Err(CodecError::InvalidBase64Format(_))
        ));
        assert!(matches!(
            base64_to_hex("=abc"),
            Err(CodecError::InvalidBase64Format(_))
        ));
        // 长度不可能是 base64
        assert!(matches!(
            base64_to_hex("A"),
            Err(CodecError::InvalidBase64Format(_))
        ));
    }

    #[test]
    fn test_base64_lenient_padding() {
        assert_eq!(base64_to_hex("3q2+7w").unwrap(), "deadbeef");
        assert_eq!(base64_to_hex("  3q2+7w==  ").unwrap(), "deadbeef");
    }

    #[test]
    fn test_psbt_magic_roundtrip() {
        // "psbt" + 0xff 魔数
        let hex = "70736274ff01";
        let b64 = hex_to_base64(hex).unwrap();
        assert!(b64.starts_with("cHNidP8"));
        assert_eq!(base64_to_hex(&b64).unwrap(), hex);
    }

    #[test]
    fn test_is_valid_psbt() {
        assert!(is_valid_psbt("70736274ff"));
        assert!(is_valid_psbt("cHNidP8B"));
        assert!(is_valid_psbt("3q2+7w=="));
        assert!(!is_valid_psbt(""));
        assert!(!is_valid_psbt("not a psbt"));
        assert!(!is_valid_psbt("abc==="));
    }

    #[test]
    fn test_encoding_normalizers() {
        assert_eq!(PsbtEncoding::detect("deadbeef"), PsbtEncoding::Hex);
        assert_eq!(PsbtEncoding::detect("3q2+7w=="), PsbtEncoding::Base64);
        assert_eq!(to_wallet_hex("3q2+7w==").unwrap(), "deadbeef");
        assert_eq!(to_wallet_hex("DEADBEEF").unwrap(), "deadbeef");
        assert_eq!(to_api_base64("deadbeef").unwrap(), "3q2+7w==");
        assert_eq!(to_api_base64("3q2+7w==").unwrap(), "3q2+7w==");
        assert!(to_api_base64("%%").is_err());
    }

    #[test]
    fn test_normalizers_accept_prefixed_and_padded_hex() {
        assert_eq!(PsbtEncoding::detect("0xdeadbeef"), PsbtEncoding::Hex);
        assert_eq!(PsbtEncoding::detect(" deadbeef "), PsbtEncoding::Hex);
        assert_eq!(PsbtEncoding::detect("0x"), PsbtEncoding::Invalid);
        assert_eq!(to_wallet_hex("0xdeadbeef").unwrap(), "deadbeef");
        assert_eq!(to_wallet_hex(" 0XDEADBEEF\n").unwrap(), "deadbeef");
        assert_eq!(to_wallet_hex(" deadbeef ").unwrap(), "deadbeef");
        assert_eq!(to_wallet_hex(" 3q2+7w== ").unwrap(), "deadbeef");
        assert_eq!(to_api_base64("0xdeadbeef").unwrap(), "3q2+7w==");
        assert_eq!(to_api_base64(" 3q2+7w ").unwrap(), "3q2+7w==");
    }

    #[test]
    fn test_normalizers_reject_odd_length_hex() {
        assert!(matches!(
            to_wallet_hex("abc"),
            Err(CodecError::InvalidHexFormat(_))
        ));
        assert!(matches!(
            to_wallet_hex("0xabc"),
            Err(CodecError::InvalidHexFormat(_))
        ));
        assert!(matches!(
            to_api_base64("abc"),
            Err(CodecError::InvalidHexFormat(_))
        ));
    }
}
