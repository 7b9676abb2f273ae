//! DID 创建/更新流程
//!
//! API 构造交易 -> base64 转 hex -> 钱包签名 -> 转回 base64 -> 推送 -> 开始确认监控

use std::sync::Arc;

use crate::{
    domain::{
        btc_address::validate_taproot_address,
        did::{
            CreateDidRequest, PushTxRequest, QueryDidRequest, QueryDidResponse, UpdateDidRequest,
            VerificationCapabilities, VmUpdate,
        },
        key_detection::{detect_key_type, is_valid_public_key},
        psbt_codec,
    },
    error::AppError,
    service::{
        did_api::DidApi,
        operation_tracker::{DidOperation, DidOperationTracker},
        wallet::WalletManager,
    },
    utils::{
        error_tracking::get_or_generate_trace_id,
        string_utils::{is_blank, strip_hex_prefix},
    },
};

pub const SUBMITTED_MESSAGE: &str = "交易已提交，正在等待确认...";

#[derive(Debug, Clone)]
pub struct CreateDidParams {
    pub alias: String,
    /// DID 控制地址，必须为 Taproot
    pub control_address: String,
    /// 支付手续费的地址，默认使用当前钱包账户
    pub spend_addr: Option<String>,
    pub verification_capabilities: VerificationCapabilities,
}

#[derive(Debug, Clone)]
pub struct UpdateDidParams {
    pub did: String,
    pub alias: String,
    /// txid:vout
    pub control_utxo: String,
    pub control_address: String,
    pub spend_addr: Option<String>,
    pub vm_updates: Vec<VmUpdate>,
}

/// 推送结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DidSubmission {
    pub commit_txid: String,
    pub reveal_txid: Option<String>,
}

pub struct DidWorkflow {
    api: Arc<dyn DidApi>,
    wallet: Arc<WalletManager>,
    tracker: Arc<DidOperationTracker>,
}

impl DidWorkflow {
    pub fn new(
        api: Arc<dyn DidApi>,
        wallet: Arc<WalletManager>,
        tracker: Arc<DidOperationTracker>,
    ) -> Self {
        Self {
            api,
            wallet,
            tracker,
        }
    }

    /// 创建 DID
    pub async fn create_did(&self, params: CreateDidParams) -> Result<DidSubmission, AppError> {
        self.tracker.begin(DidOperation::Create).await;
        let result = self.run_create(params).await;
        self.settle(DidOperation::Create, &result).await;
        result
    }

    async fn run_create(&self, params: CreateDidParams) -> Result<DidSubmission, AppError> {
        let account = self.require_account().await?;

        if is_blank(&params.alias) {
            return Err(AppError::invalid_parameter("alias is required"));
        }
        validate_taproot_address(&params.control_address, self.wallet.network())?;

        let public_key = self.wallet.get_public_key().await?;
        let public_key = strip_hex_prefix(&public_key).to_lowercase();
        let key_type = detect_key_type(&public_key);
        if !is_valid_public_key(&public_key, Some(key_type)) {
            return Err(AppError::invalid_public_key(format!(
                "wallet public key is not a valid {} key",
                key_type.display_name()
            )));
        }

        let req = CreateDidRequest {
            spend_addr: params.spend_addr.unwrap_or(account),
            verification_capabilities: params.verification_capabilities,
            control_address: params.control_address,
            subject_public_key: public_key,
            key_type,
        };
        tracing::info!(
            alias = %params.alias,
            key_type = %key_type,
            control_address = %req.control_address,
            "Creating DID"
        );

        let resp = self.api.create_did(&req).await?;
        self.sign_and_push(&resp.psbt, &params.alias, None, None)
            .await
    }

    /// 更新 DID（commit 与 reveal 两笔交易都需要签名）
    pub async fn update_did(&self, params: UpdateDidParams) -> Result<DidSubmission, AppError> {
        self.tracker.begin(DidOperation::Update).await;
        let result = self.run_update(params).await;
        self.settle(DidOperation::Update, &result).await;
        result
    }

    async fn run_update(&self, params: UpdateDidParams) -> Result<DidSubmission, AppError> {
        let account = self.require_account().await?;

        if is_blank(&params.did) {
            return Err(AppError::invalid_parameter("did is required"));
        }
        if params.vm_updates.is_empty() {
            return Err(AppError::invalid_parameter("at least one verification method update is required"));
        }
        match params.control_utxo.split_once(':') {
            Some((txid, vout)) if !txid.is_empty() && vout.parse::<u32>().is_ok() => {}
            _ => {
                return Err(AppError::invalid_parameter(
                    "control_utxo must be formatted as txid:vout",
                ))
            }
        }
        validate_taproot_address(&params.control_address, self.wallet.network())?;

        let req = UpdateDidRequest {
            control_utxo: params.control_utxo,
            spend_addr: params.spend_addr.unwrap_or(account),
            control_address: params.control_address,
            vm_updates: params.vm_updates,
        };
        tracing::info!(did = %params.did, updates = req.vm_updates.len(), "Updating DID");

        let resp = self.api.update_did(&req).await?;
        self.sign_and_push(
            &resp.commit_psbt,
            &params.alias,
            Some(&resp.reveal_psbt),
            Some(params.did),
        )
        .await
    }

    /// 签名 API 返回的 base64 PSBT，返回 base64 签名结果
    pub async fn sign_psbt_for_api(&self, psbt_base64: &str) -> Result<String, AppError> {
        self.tracker.begin(DidOperation::Sign).await;
        let result = self.sign_inner(psbt_base64).await;
        self.settle(DidOperation::Sign, &result).await;
        result
    }

    async fn sign_inner(&self, psbt_base64: &str) -> Result<String, AppError> {
        if !self.wallet.is_connected().await {
            return Err(AppError::wallet_not_connected());
        }
        // API 侧始终是 base64，纯十六进制字符的 base64 也按 base64 解码
        let psbt_hex = psbt_codec::base64_to_hex(psbt_base64)?;
        let signed = self.wallet.sign_psbt(&psbt_hex).await?;
        Ok(psbt_codec::to_api_base64(&signed)?)
    }

    /// 签名并推送，成功后开始监控 commit 交易
    pub async fn sign_and_push(
        &self,
        commit_psbt: &str,
        alias: &str,
        reveal_psbt: Option<&str>,
        did: Option<String>,
    ) -> Result<DidSubmission, AppError> {
        let signed_commit = self.sign_psbt_for_api(commit_psbt).await?;
        let signed_reveal = match reveal_psbt {
            Some(reveal) => Some(self.sign_psbt_for_api(reveal).await?),
            None => None,
        };

        let req = PushTxRequest {
            alias: alias.to_string(),
            commit_psbt: signed_commit,
            did,
            reveal_psbt: signed_reveal,
        };

        self.tracker.begin(DidOperation::Push).await;
        let pushed = self.api.push_transaction(&req).await.map_err(AppError::from);
        let result = pushed.map(|resp| DidSubmission {
            commit_txid: resp.commit_txid,
            reveal_txid: resp.reveal_txid,
        });
        self.settle(DidOperation::Push, &result).await;

        let submission = result?;
        self.tracker.start_monitoring(&submission.commit_txid).await;
        Ok(submission)
    }

    /// 查询当前钱包的 DID 列表
    pub async fn list_my_dids(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<QueryDidResponse, AppError> {
        let state = self.wallet.snapshot().await;
        let req = QueryDidRequest::new(state.account, state.public_key).with_page(page, page_size);
        if !req.has_subject() {
            return Err(AppError::wallet_not_connected());
        }
        Ok(self.api.query_dids(&req).await?)
    }

    async fn require_account(&self) -> Result<String, AppError> {
        let state = self.wallet.snapshot().await;
        match (state.connected, state.account) {
            (true, Some(account)) => Ok(account),
            _ => Err(AppError::wallet_not_connected()),
        }
    }

    async fn settle<T>(&self, op: DidOperation, result: &Result<T, AppError>) {
        match result {
            Ok(_) => {
                let message = matches!(op, DidOperation::Push).then(|| SUBMITTED_MESSAGE.to_string());
                self.tracker.finish(op, message).await;
            }
            Err(e) => {
                let trace_id = get_or_generate_trace_id(e.trace_id.as_deref());
                tracing::error!(
                    trace_id = %trace_id,
                    operation = op.as_str(),
                    code = e.code.as_str(),
                    error = %e.message,
                    "DID workflow step failed"
                );
                self.tracker.fail(op, e.user_message()).await
            }
        }
    }
}
