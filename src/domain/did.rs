//! DID 领域模型
//!
//! 与远程 DID API 交互的请求/响应结构（JSON 字段为 camelCase）

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        key_type::KeyType,
        multibase_key::{decode_public_key, encode_public_key, DecodedPublicKey},
    },
    error::CodecError,
};

/// 分页大小上限
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// 验证能力位掩码（8-bit）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationCapabilities(pub u8);

impl VerificationCapabilities {
    /// Bit 0: 身份验证
    pub const AUTHENTICATION: Self = Self(1);
    /// Bit 1: 签名断言
    pub const ASSERTION_METHOD: Self = Self(2);
    /// Bit 2: 密钥协商
    pub const KEY_AGREEMENT: Self = Self(4);
    /// Bit 3: 能力调用
    pub const CAPABILITY_INVOCATION: Self = Self(8);
    /// Bit 4: 能力委派
    pub const CAPABILITY_DELEGATION: Self = Self(16);

    pub fn empty() -> Self {
        Self(0)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// 已设置能力的名称
    pub fn names(&self) -> Vec<&'static str> {
        [
            (Self::AUTHENTICATION, "authentication"),
            (Self::ASSERTION_METHOD, "assertionMethod"),
            (Self::KEY_AGREEMENT, "keyAgreement"),
            (Self::CAPABILITY_INVOCATION, "capabilityInvocation"),
            (Self::CAPABILITY_DELEGATION, "capabilityDelegation"),
        ]
        .into_iter()
        .filter(|(cap, _)| self.contains(*cap))
        .map(|(_, name)| name)
        .collect()
    }
}

impl std::ops::BitOr for VerificationCapabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// DID 项目总体数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidSummary {
    pub did_count: u64,
}

/// 创建 DID 请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDidRequest {
    /// 用于选择 UTXO 支付费用的地址
    pub spend_addr: String,
    pub verification_capabilities: VerificationCapabilities,
    /// DID 控制地址（P2TR）
    pub control_address: String,
    /// hex 编码的公钥
    pub subject_public_key: String,
    pub key_type: KeyType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDidResponse {
    /// Base64 编码的 PSBT
    pub psbt: String,
}

/// 验证方法更新指令
///
/// - 只有 `k`/`vr`：新增
/// - 只有 `i`：删除
/// - `i` + `k` + `vr`：替换
/// - `i` + `vr`：更新验证关系
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VmUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub i: Option<u32>,
    /// multibase 编码后的公钥
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vr: Option<VerificationCapabilities>,
}

impl VmUpdate {
    pub fn add(
        public_key_hex: &str,
        key_type: KeyType,
        vr: VerificationCapabilities,
    ) -> Result<Self, CodecError> {
        Ok(Self {
            i: None,
            k: Some(encode_public_key(public_key_hex, key_type)?),
            vr: Some(vr),
        })
    }

    pub fn remove(index: u32) -> Self {
        Self {
            i: Some(index),
            ..Default::default()
        }
    }

    pub fn replace(
        index: u32,
        public_key_hex: &str,
        key_type: KeyType,
        vr: VerificationCapabilities,
    ) -> Result<Self, CodecError> {
        Ok(Self {
            i: Some(index),
            k: Some(encode_public_key(public_key_hex, key_type)?),
            vr: Some(vr),
        })
    }

    pub fn set_relationships(index: u32, vr: VerificationCapabilities) -> Self {
        Self {
            i: Some(index),
            k: None,
            vr: Some(vr),
        }
    }
}

/// 更新 DID 请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDidRequest {
    pub control_utxo: String,
    pub spend_addr: String,
    pub control_address: String,
    pub vm_updates: Vec<VmUpdate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDidResponse {
    pub commit_psbt: String,
    pub reveal_psbt: String,
}

/// 推送已签名交易
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushTxRequest {
    pub alias: String,
    pub commit_psbt: String,
    /// 更新时填写，创建时为空
    #[serde(skip_serializing_if = "Option::is_none")]
    pub did: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reveal_psbt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushTxResponse {
    pub commit_txid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reveal_txid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxStatusResponse {
    pub status: crate::domain::transaction_status::DidTxStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub did: Option<String>,
}

/// 查询 DID 列表（address 与 publicKey 至少一个）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDidRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl QueryDidRequest {
    pub fn new(address: Option<String>, public_key: Option<String>) -> Self {
        Self {
            address,
            public_key,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// 页码从1开始，页大小限制在 1-100
    pub fn with_page(mut self, page: u32, page_size: u32) -> Self {
        self.page = page.max(1);
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn has_subject(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false);
        filled(&self.address) || filled(&self.public_key)
    }
}

/// 验证方法
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type", default = "default_vm_type")]
    pub method_type: String,
    pub public_key_multibase: String,
    #[serde(default)]
    pub capabilities: VerificationCapabilities,
}

fn default_vm_type() -> String {
    "Multikey".to_string()
}

impl VerificationMethod {
    pub fn decode_public_key(&self) -> Result<DecodedPublicKey, CodecError> {
        decode_public_key(&self.public_key_multibase)
    }
}

/// DID 信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidInfo {
    #[serde(default)]
    pub alias: String,
    pub did: String,
    #[serde(default)]
    pub controller: String,
    #[serde(default)]
    pub verification_methods: Vec<VerificationMethod>,
    #[serde(default)]
    pub authentication: Vec<String>,
    #[serde(default)]
    pub assertion: Vec<String>,
    #[serde(default)]
    pub status: String,
    /// txid:vout
    #[serde(default)]
    pub control_utxo: String,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl DidInfo {
    pub fn updated_at_utc(&self) -> Option<DateTime<Utc>> {
        timestamp_to_utc(self.updated_at)
    }

    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        timestamp_to_utc(self.created_at)
    }

    /// 拆分 control_utxo 为 (txid, vout)
    pub fn control_outpoint(&self) -> Option<(&str, u32)> {
        let (txid, vout) = self.control_utxo.split_once(':')?;
        Some((txid, vout.parse().ok()?))
    }
}

/// 兼容秒级与毫秒级时间戳
fn timestamp_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    if ts <= 0 {
        return None;
    }
    if ts > 10_000_000_000 {
        Utc.timestamp_millis_opt(ts).single()
    } else {
        Utc.timestamp_opt(ts, 0).single()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDidResponse {
    pub count: u64,
    pub page: u32,
    pub page_size: u32,
    #[serde(default)]
    pub dids: Vec<DidInfo>,
}

impl QueryDidResponse {
    pub fn total_pages(&self) -> u32 {
        if self.page_size == 0 {
            return 0;
        }
        self.count.div_ceil(self.page_size as u64) as u32
    }

    pub fn has_next_page(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_prev_page(&self) -> bool {
        self.page > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_bits() {
        let caps = VerificationCapabilities::AUTHENTICATION
            | VerificationCapabilities::CAPABILITY_INVOCATION;
        assert_eq!(caps.bits(), 9);
        assert!(caps.contains(VerificationCapabilities::AUTHENTICATION));
        assert!(!caps.contains(VerificationCapabilities::KEY_AGREEMENT));
        assert_eq!(caps.names(), vec!["authentication", "capabilityInvocation"]);
    }

    #[test]
    fn test_create_request_wire_format() {
        let req = CreateDidRequest {
            spend_addr: "tb1pspend".into(),
            verification_capabilities: VerificationCapabilities(3),
            control_address: "tb1pcontrol".into(),
            subject_public_key: "02ab".into(),
            key_type: KeyType::Secp256k1,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["spendAddr"], "tb1pspend");
        assert_eq!(json["verificationCapabilities"], 3);
        assert_eq!(json["subjectPublicKey"], "02ab");
        assert_eq!(json["keyType"], "secp256k1");
    }

    #[test]
    fn test_vm_update_variants() {
        let add = VmUpdate::add("02ab", KeyType::Secp256k1, VerificationCapabilities(1)).unwrap();
        assert!(add.k.as_deref().unwrap().starts_with('z'));
        assert_eq!(add.i, None);

        let json = serde_json::to_value(VmUpdate::remove(2)).unwrap();
        assert_eq!(json, serde_json::json!({ "i": 2 }));

        assert!(VmUpdate::add("xyz", KeyType::Secp256k1, VerificationCapabilities(1)).is_err());
    }

    #[test]
    fn test_push_request_skips_empty_fields() {
        let req = PushTxRequest {
            alias: "alice".into(),
            commit_psbt: "cHNidP8B".into(),
            did: None,
            reveal_psbt: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("did").is_none());
        assert!(json.get("revealPsbt").is_none());
        assert_eq!(json["commitPsbt"], "cHNidP8B");
    }

    #[test]
    fn test_query_request_bounds() {
        let q = QueryDidRequest::new(Some("tb1p".into()), None).with_page(0, 500);
        assert_eq!(q.page, 1);
        assert_eq!(q.page_size, 100);
        assert!(q.has_subject());
        assert!(!QueryDidRequest::new(Some(" ".into()), None).has_subject());
    }

    #[test]
    fn test_query_response_pagination() {
        let resp: QueryDidResponse = serde_json::from_value(serde_json::json!({
            "count": 45, "page": 2, "pageSize": 20, "dids": []
        }))
        .unwrap();
        assert_eq!(resp.total_pages(), 3);
        assert!(resp.has_next_page());
        assert!(resp.has_prev_page());
    }

    #[test]
    fn test_did_info_parsing() {
        let info: DidInfo = serde_json::from_value(serde_json::json!({
            "alias": "alice",
            "did": "did:btc:abc",
            "controller": "tb1pcontrol",
            "verificationMethods": [{
                "id": "did:btc:abc#key-0",
                "publicKeyMultibase": crate::domain::multibase_key::encode_public_key(
                    "02ab", KeyType::Secp256k1).unwrap(),
                "capabilities": 3
            }],
            "status": "active",
            "controlUtxo": "deadbeef:1",
            "createdAt": 1700000000,
            "updatedAt": 1700000000000i64
        }))
        .unwrap();
        assert_eq!(info.verification_methods[0].method_type, "Multikey");
        let decoded = info.verification_methods[0].decode_public_key().unwrap();
        assert_eq!(decoded.public_key_hex, "02ab");
        assert_eq!(info.control_outpoint(), Some(("deadbeef", 1)));
        assert_eq!(info.created_at_utc(), info.updated_at_utc());
    }
}
