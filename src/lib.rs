//! didcore - 比特币 DID 密钥编解码与签名流程
//!
//! multibase 公钥编解码、PSBT hex/base64 转换、密钥类型识别，
//! 以及基于浏览器钱包的 DID 创建/更新流程

pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod error_map;
pub mod infrastructure;
pub mod service;
pub mod utils;

// 重新导出常用类型
pub use app_state::AppState;
pub use error::{AppError, AppErrorCode, CodecError};

pub mod prelude {
    pub use crate::{
        app_state::AppState,
        domain::{
            base64_to_hex, decode_public_key, detect_key_type, encode_public_key, hex_to_base64,
            is_valid_psbt, is_valid_public_key, DecodedPublicKey, KeyType,
        },
        error::{AppError, AppErrorCode, CodecError},
    };
}
