//! 字符串工具模块
//! 提供十六进制前缀处理与展示格式化函数

const SATS_PER_BTC: f64 = 100_000_000.0;

/// 去掉可选的 0x / 0X 前缀
pub fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// 公钥缩略展示：前8位...后8位
pub fn format_public_key(public_key: &str) -> String {
    let clean = strip_hex_prefix(public_key);
    if clean.len() <= 16 || !clean.is_ascii() {
        return clean.to_string();
    }
    format!("{}...{}", &clean[..8], &clean[clean.len() - 8..])
}

/// 比特币地址缩略展示：前6位...后4位
pub fn format_bitcoin_address(address: &str) -> String {
    if address.is_empty() {
        return String::new();
    }
    if address.len() <= 10 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

/// 聪转 BTC 展示（8位小数）
pub fn format_bitcoin_balance(sats: u64) -> String {
    if sats == 0 {
        return "0".to_string();
    }
    format!("{:.8} BTC", sats as f64 / SATS_PER_BTC)
}

/// 检查字符串是否为空或只包含空白字符
pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_hex_prefix() {
        assert_eq!(strip_hex_prefix("0xabc"), "abc");
        assert_eq!(strip_hex_prefix("0XABC"), "ABC");
        assert_eq!(strip_hex_prefix("abc"), "abc");
        assert_eq!(strip_hex_prefix("0x"), "");
    }

    #[test]
    fn test_format_public_key() {
        assert_eq!(format_public_key("0x1234"), "1234");
        assert_eq!(
            format_public_key("03a34b99f22c790c4e36b2b3c2c35a36db06226e41c692fc82b8b56ac1c540c5bd"),
            "03a34b99...c540c5bd"
        );
    }

    #[test]
    fn test_format_bitcoin_address() {
        assert_eq!(
            format_bitcoin_address("bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh"),
            "bc1qxy...0wlh"
        );
        assert_eq!(format_bitcoin_address(""), "");
    }

    #[test]
    fn test_format_bitcoin_balance() {
        assert_eq!(format_bitcoin_balance(0), "0");
        assert_eq!(format_bitcoin_balance(12_345), "0.00012345 BTC");
        assert_eq!(format_bitcoin_balance(150_000_000), "1.50000000 BTC");
    }
}
