//! didcore 命令行入口
//! 公钥 multibase 编解码、PSBT 格式转换与 DID 交易状态查询

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use didcore::{
    app_state::AppState,
    config::Config,
    domain::{
        key_detection::{detect_key_type, is_valid_public_key},
        key_type::KeyType,
        multibase_key::{decode_public_key, encode_public_key_with_type_name},
        psbt_codec::{base64_to_hex, hex_to_base64},
    },
    infrastructure::logging,
    utils::string_utils::format_public_key,
};

#[derive(Parser, Debug)]
#[command(name = "didcore", version, about = "Bitcoin DID key and PSBT utility")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 公钥 hex 编码为 multibase
    Encode {
        public_key: String,
        /// ed25519 | secp256k1 | p256 | p384 | bls12-381 | sm2
        #[arg(default_value = "secp256k1")]
        key_type: String,
    },
    /// multibase 解码为公钥 hex
    Decode { multibase: String },
    /// 根据公钥 hex 推断密钥类型
    Detect { public_key: String },
    /// PSBT base64 转 hex
    ToHex { base64: String },
    /// PSBT hex 转 base64
    ToBase64 { hex: String },
    /// DID 总数
    Summary,
    /// 查询一次交易状态
    Status { commit_txid: String },
    /// 轮询直到交易进入最终状态
    Watch { commit_txid: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match std::env::var("CONFIG_PATH") {
        Ok(path) => Config::from_env_and_file(Some(path.as_str()))?,
        Err(_) => Config::from_env()?,
    };
    config.validate()?;

    let _log_guard = logging::init_logging(&config.logging).unwrap_or_else(|e| {
        eprintln!("Failed to initialize logging: {}", e);
        None
    });

    match cli.command {
        Command::Encode {
            public_key,
            key_type,
        } => {
            println!("{}", encode_public_key_with_type_name(&public_key, &key_type)?);
        }
        Command::Decode { multibase } => {
            let decoded = decode_public_key(&multibase)?;
            println!("{}", serde_json::to_string_pretty(&decoded)?);
        }
        Command::Detect { public_key } => {
            let key_type: KeyType = detect_key_type(&public_key);
            let output = serde_json::json!({
                "publicKey": format_public_key(&public_key),
                "keyType": key_type,
                "displayName": key_type.display_name(),
                "valid": is_valid_public_key(&public_key, Some(key_type)),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::ToHex { base64 } => println!("{}", base64_to_hex(&base64)?),
        Command::ToBase64 { hex } => println!("{}", hex_to_base64(&hex)?),
        Command::Summary => {
            let state = AppState::from_config(Arc::new(config), Vec::new())?;
            let summary = state.api.get_summary().await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Status { commit_txid } => {
            let state = AppState::from_config(Arc::new(config), Vec::new())?;
            let status = state.api.get_transaction_status(&commit_txid).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Command::Watch { commit_txid } => {
            let state = AppState::from_config(Arc::new(config), Vec::new())?;
            let status = state.monitor.watch(&commit_txid).await?;
            println!("{} ({})", status, status.description());
        }
    }

    Ok(())
}
