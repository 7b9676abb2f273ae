use crate::error::AppErrorCode;

/// 错误码到用户提示文案的映射（与前端文案保持一致）
pub fn user_message(code: AppErrorCode) -> Option<&'static str> {
    let msg = match code {
        AppErrorCode::InvalidHexFormat => "公钥或交易数据不是有效的十六进制格式",
        AppErrorCode::InvalidBase64Format => "交易数据不是有效的 Base64 格式",
        AppErrorCode::InvalidMultibaseFormat => "公钥编码格式无效",
        AppErrorCode::UnsupportedKeyType => "不支持的密钥类型",
        AppErrorCode::InvalidPublicKey => "钱包公钥格式无效",
        AppErrorCode::InvalidPsbt => "PSBT数据格式无效",
        AppErrorCode::WalletNotInstalled => "未检测到钱包插件，请先安装",
        AppErrorCode::WalletNotConnected => "钱包未连接，请先连接钱包",
        AppErrorCode::WalletRejected => "用户拒绝了钱包请求",
        AppErrorCode::Network => "网络异常，请检查连接",
        AppErrorCode::Timeout => "请求超时，请稍后重试",
        AppErrorCode::Internal => "服务开小差了，请稍后再试",
        // 其余错误直接展示原始消息
        AppErrorCode::InvalidAddress
        | AppErrorCode::InvalidParameter
        | AppErrorCode::WalletUnsupported
        | AppErrorCode::WalletError
        | AppErrorCode::ExternalServiceError
        | AppErrorCode::TransactionFailed => return None,
    };
    Some(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapped_and_passthrough_codes() {
        assert_eq!(
            user_message(AppErrorCode::WalletNotConnected),
            Some("钱包未连接，请先连接钱包")
        );
        assert!(user_message(AppErrorCode::InvalidAddress).is_none());
    }
}
