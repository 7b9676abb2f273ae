//! 测试辅助模块
//! 提供内存版 DID API 与钱包插件

#![allow(dead_code)]

use std::{
    collections::VecDeque,
    path::Path,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use didcore::{
    domain::{
        btc_address::BitcoinNetwork,
        did::{
            CreateDidRequest, CreateDidResponse, DidSummary, PushTxRequest, PushTxResponse,
            QueryDidRequest, QueryDidResponse, TxStatusResponse, UpdateDidRequest,
            UpdateDidResponse,
        },
        transaction_status::DidTxStatus,
    },
    error::{DidApiError, WalletError},
    infrastructure::preference_store::PreferenceStore,
    service::{
        did_api::DidApi,
        wallet::{ProviderSurface, WalletCapability, WalletKind, WalletManager, WalletTransport},
    },
};
use serde_json::{json, Value};

pub const TEST_ACCOUNT: &str = "tb1pqqqqp399et2xygdj5xreqhjjvcmzhxw4aywxecjdzew6hylgvsesf3hn0c";
pub const TEST_PUBLIC_KEY: &str =
    "03a34b99f22c790c4e36b2b3c2c35a36db06226e41c692fc82b8b56ac1c540c5bd";
/// "psbt" 魔数 + 0xff 分隔
pub const UNSIGNED_PSBT_HEX: &str = "70736274ff01";
/// 钱包签名时追加的字节
pub const SIGNATURE_SUFFIX: &str = "aa";

/// 内存钱包插件
pub struct FakeWalletTransport {
    pub kind: WalletKind,
    pub installed: bool,
    pub surface: ProviderSurface,
    pub accounts: Vec<String>,
    pub public_key: Option<String>,
    pub fail_switch: bool,
    pub calls: Mutex<Vec<(WalletCapability, String, Value)>>,
}

impl FakeWalletTransport {
    pub fn new(kind: WalletKind) -> Self {
        Self {
            kind,
            installed: true,
            surface: ProviderSurface {
                bitcoin_namespace: true,
                generic_request: true,
            },
            accounts: vec![TEST_ACCOUNT.to_string()],
            public_key: Some(TEST_PUBLIC_KEY.to_string()),
            fail_switch: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn generic_only(mut self) -> Self {
        self.surface = ProviderSurface {
            bitcoin_namespace: false,
            generic_request: true,
        };
        self
    }

    pub fn called_methods(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, method, _)| method.clone())
            .collect()
    }

    pub fn last_params(&self, method: &str) -> Option<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(_, m, _)| m == method)
            .map(|(_, _, params)| params.clone())
    }
}

#[async_trait]
impl WalletTransport for FakeWalletTransport {
    fn kind(&self) -> WalletKind {
        self.kind
    }

    fn is_installed(&self) -> bool {
        self.installed
    }

    fn surface(&self) -> ProviderSurface {
        self.surface
    }

    async fn call(
        &self,
        capability: WalletCapability,
        method: &str,
        params: Value,
    ) -> Result<Value, WalletError> {
        self.calls
            .lock()
            .unwrap()
            .push((capability, method.to_string(), params.clone()));

        let failed = |message: &str| WalletError::CallFailed {
            method: method.to_string(),
            message: message.to_string(),
        };

        match method.trim_start_matches("bitcoin_") {
            "requestAccounts" => Ok(json!(self.accounts)),
            "getPublicKey" => self
                .public_key
                .clone()
                .map(Value::String)
                .ok_or_else(|| failed("getPublicKey not available")),
            "switchNetwork" | "switchChain" | "wallet_switchBitcoinNetwork" => {
                if self.fail_switch {
                    Err(failed("network switch not supported"))
                } else {
                    Ok(Value::Null)
                }
            }
            "getNetwork" => Ok(json!("testnet")),
            "getBalance" => Ok(json!({ "confirmed": 12000, "unconfirmed": 345, "total": 12345 })),
            "signPsbt" => {
                let psbt = params[0].as_str().ok_or_else(|| failed("missing psbt"))?;
                Ok(json!(format!("{}{}", psbt, SIGNATURE_SUFFIX)))
            }
            "signMessage" => {
                let message = params[0].as_str().unwrap_or_default();
                Ok(json!(format!("sig:{}", message)))
            }
            other => Err(failed(&format!("unknown method {}", other))),
        }
    }
}

/// 内存 DID API
pub struct FakeDidApi {
    pub create_psbt: String,
    pub update_response: UpdateDidResponse,
    pub commit_txid: String,
    pub statuses: Mutex<VecDeque<Result<DidTxStatus, DidApiError>>>,
    pub status_calls: AtomicU32,
    pub creates: Mutex<Vec<CreateDidRequest>>,
    pub updates: Mutex<Vec<UpdateDidRequest>>,
    pub pushes: Mutex<Vec<PushTxRequest>>,
    pub queries: Mutex<Vec<QueryDidRequest>>,
}

impl Default for FakeDidApi {
    fn default() -> Self {
        let unsigned_b64 = didcore::domain::psbt_codec::hex_to_base64(UNSIGNED_PSBT_HEX)
            .expect("static psbt");
        Self {
            create_psbt: unsigned_b64.clone(),
            update_response: UpdateDidResponse {
                commit_psbt: unsigned_b64.clone(),
                reveal_psbt: unsigned_b64,
            },
            commit_txid: "c0ffee".to_string(),
            statuses: Mutex::new(VecDeque::new()),
            status_calls: AtomicU32::new(0),
            creates: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
            pushes: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
        }
    }
}

impl FakeDidApi {
    pub fn with_statuses(statuses: Vec<Result<DidTxStatus, DidApiError>>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl DidApi for FakeDidApi {
    async fn get_summary(&self) -> Result<DidSummary, DidApiError> {
        Ok(DidSummary { did_count: 7 })
    }

    async fn create_did(&self, req: &CreateDidRequest) -> Result<CreateDidResponse, DidApiError> {
        self.creates.lock().unwrap().push(req.clone());
        Ok(CreateDidResponse {
            psbt: self.create_psbt.clone(),
        })
    }

    async fn update_did(&self, req: &UpdateDidRequest) -> Result<UpdateDidResponse, DidApiError> {
        self.updates.lock().unwrap().push(req.clone());
        Ok(self.update_response.clone())
    }

    async fn push_transaction(&self, req: &PushTxRequest) -> Result<PushTxResponse, DidApiError> {
        self.pushes.lock().unwrap().push(req.clone());
        Ok(PushTxResponse {
            commit_txid: self.commit_txid.clone(),
            reveal_txid: req.reveal_psbt.as_ref().map(|_| "beef".to_string()),
        })
    }

    async fn get_transaction_status(
        &self,
        _commit_txid: &str,
    ) -> Result<TxStatusResponse, DidApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.statuses.lock().unwrap().pop_front();
        let status = match next {
            Some(result) => result?,
            None => DidTxStatus::Pending,
        };
        Ok(TxStatusResponse {
            status,
            did: status.is_success().then(|| "did:btc:c0ffee".to_string()),
        })
    }

    async fn query_dids(&self, req: &QueryDidRequest) -> Result<QueryDidResponse, DidApiError> {
        self.queries.lock().unwrap().push(req.clone());
        Ok(QueryDidResponse {
            count: 0,
            page: req.page,
            page_size: req.page_size,
            dids: Vec::new(),
        })
    }
}

/// 创建注入内存钱包的 WalletManager
pub fn wallet_manager(
    transports: Vec<Arc<FakeWalletTransport>>,
    preference_path: &Path,
) -> WalletManager {
    let transports = transports
        .into_iter()
        .map(|t| t as Arc<dyn WalletTransport>)
        .collect();
    WalletManager::new(
        transports,
        PreferenceStore::new(preference_path),
        BitcoinNetwork::Testnet,
    )
}
