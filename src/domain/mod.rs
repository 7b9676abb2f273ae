//! Domain 模块
//!
//! 密钥编解码、PSBT 转换与 DID 领域模型

pub mod btc_address;
pub mod did;
pub mod key_detection;
pub mod key_type;
pub mod multibase_key;
pub mod psbt_codec;
pub mod transaction_status;

// Re-exports
pub use btc_address::{AddressError, BitcoinNetwork, BtcAddressType};
pub use did::{
    CreateDidRequest, CreateDidResponse, DidInfo, DidSummary, PushTxRequest, PushTxResponse,
    QueryDidRequest, QueryDidResponse, TxStatusResponse, UpdateDidRequest, UpdateDidResponse,
    VerificationCapabilities, VerificationMethod, VmUpdate,
};
pub use key_detection::{detect_key_type, is_valid_public_key};
pub use key_type::KeyType;
pub use multibase_key::{decode_public_key, encode_public_key, DecodedPublicKey};
pub use psbt_codec::{base64_to_hex, hex_to_base64, is_valid_psbt, PsbtEncoding};
pub use transaction_status::DidTxStatus;
