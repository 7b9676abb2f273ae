//! 钱包会话管理
//!
//! 显式状态容器取代全局单例：调用方持有 `Arc<WalletManager>` 并注入到工作流

use std::{collections::HashMap, sync::Arc};

use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use super::{
    expect_string, first_account, parse_balance, WalletCapability, WalletKind, WalletMethod,
    WalletTransport,
};
use crate::{
    domain::{btc_address::BitcoinNetwork, psbt_codec},
    error::{AppError, WalletError},
    infrastructure::preference_store::PreferenceStore,
    utils::string_utils::{format_bitcoin_address, format_bitcoin_balance},
};

/// 钱包会话状态
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletState {
    pub connected: bool,
    pub kind: Option<WalletKind>,
    pub capability: Option<WalletCapability>,
    pub account: Option<String>,
    pub public_key: Option<String>,
    pub network: Option<String>,
    /// 聪
    pub balance: Option<u64>,
    pub is_connecting: bool,
    pub connection_error: Option<String>,
}

pub struct WalletManager {
    transports: HashMap<WalletKind, Arc<dyn WalletTransport>>,
    state: RwLock<WalletState>,
    preferences: PreferenceStore,
    network: BitcoinNetwork,
}

impl WalletManager {
    pub fn new(
        transports: Vec<Arc<dyn WalletTransport>>,
        preferences: PreferenceStore,
        network: BitcoinNetwork,
    ) -> Self {
        let transports = transports.into_iter().map(|t| (t.kind(), t)).collect();
        Self {
            transports,
            state: RwLock::new(WalletState::default()),
            preferences,
            network,
        }
    }

    pub fn network(&self) -> BitcoinNetwork {
        self.network
    }

    /// 已注册的钱包及安装情况
    pub fn available_wallets(&self) -> Vec<(WalletKind, bool)> {
        WalletKind::ALL
            .iter()
            .filter_map(|kind| self.transports.get(kind).map(|t| (*kind, t.is_installed())))
            .collect()
    }

    pub async fn snapshot(&self) -> WalletState {
        self.state.read().await.clone()
    }

    pub async fn is_connected(&self) -> bool {
        self.state.read().await.connected
    }

    pub async fn account(&self) -> Option<String> {
        self.state.read().await.account.clone()
    }

    /// 连接钱包
    ///
    /// 请求账户失败即连接失败；公钥获取与网络切换失败只记录日志
    pub async fn connect(&self, kind: WalletKind) -> Result<WalletState, WalletError> {
        {
            let mut state = self.state.write().await;
            state.is_connecting = true;
            state.connection_error = None;
        }

        match self.try_connect(kind).await {
            Ok(state) => {
                if let Err(e) = self.preferences.save(kind) {
                    tracing::warn!(wallet = %kind, error = %e, "Failed to persist wallet preference");
                }
                tracing::info!(
                    wallet = %kind,
                    account = %state.account.as_deref().map(format_bitcoin_address).unwrap_or_default(),
                    capability = ?state.capability,
                    "Wallet connected"
                );
                Ok(state)
            }
            Err(e) => {
                tracing::warn!(wallet = %kind, error = %e, "Wallet connection failed");
                let mut state = self.state.write().await;
                *state = WalletState {
                    connection_error: Some(e.to_string()),
                    ..WalletState::default()
                };
                Err(e)
            }
        }
    }

    async fn try_connect(&self, kind: WalletKind) -> Result<WalletState, WalletError> {
        let transport = self
            .transports
            .get(&kind)
            .cloned()
            .ok_or_else(|| WalletError::NotInstalled(kind.display_name().to_string()))?;

        if !transport.is_installed() {
            return Err(WalletError::NotInstalled(kind.display_name().to_string()));
        }

        let capability = WalletCapability::negotiate(transport.surface());
        if !capability.is_supported() {
            return Err(WalletError::Unsupported(kind.display_name().to_string()));
        }

        let accounts =
            invoke(transport.as_ref(), capability, WalletMethod::RequestAccounts, json!([])).await?;
        let account =
            first_account("requestAccounts", &accounts)?.ok_or(WalletError::NoAccounts)?;

        let public_key = match fetch_public_key(transport.as_ref(), capability).await {
            Ok(pk) => Some(pk),
            Err(e) => {
                tracing::warn!(wallet = %kind, error = %e, "Unable to get public key at connect");
                None
            }
        };

        let network = match self.switch_network(transport.as_ref(), capability).await {
            Ok(()) => Some(self.network.wallet_network_name().to_string()),
            Err(e) => {
                tracing::info!(wallet = %kind, error = %e, "Network switch failed, keeping current network");
                fetch_network(transport.as_ref(), capability).await.ok()
            }
        };

        let mut state = self.state.write().await;
        *state = WalletState {
            connected: true,
            kind: Some(kind),
            capability: Some(capability),
            account: Some(account),
            public_key,
            network,
            balance: None,
            is_connecting: false,
            connection_error: None,
        };
        Ok(state.clone())
    }

    async fn switch_network(
        &self,
        transport: &dyn WalletTransport,
        capability: WalletCapability,
    ) -> Result<(), WalletError> {
        let target = match (capability, transport.kind()) {
            (WalletCapability::BitcoinNamespace, WalletKind::Unisat) => self.network.unisat_chain(),
            _ => self.network.wallet_network_name(),
        };
        invoke(transport, capability, WalletMethod::SwitchNetwork, json!([target])).await?;
        Ok(())
    }

    /// 断开连接，保留钱包偏好用于下次自动重连
    pub async fn disconnect(&self) {
        let mut state = self.state.write().await;
        if let Some(kind) = state.kind {
            tracing::info!(wallet = %kind, "Wallet disconnected");
        }
        *state = WalletState::default();
    }

    /// 按已保存的偏好静默重连，失败不影响调用方
    pub async fn auto_reconnect(&self) -> Option<WalletState> {
        let kind = match self.preferences.load() {
            Ok(Some(kind)) => kind,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load wallet preference");
                return None;
            }
        };

        let installed = self
            .transports
            .get(&kind)
            .map(|t| t.is_installed())
            .unwrap_or(false);
        if !installed {
            tracing::debug!(wallet = %kind, "Preferred wallet not installed, skip auto reconnect");
            return None;
        }

        match self.connect(kind).await {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!(wallet = %kind, error = %e, "Auto reconnect failed");
                None
            }
        }
    }

    /// 当前钱包及协商结果
    async fn current(&self) -> Result<(Arc<dyn WalletTransport>, WalletCapability), WalletError> {
        let state = self.state.read().await;
        match (state.connected, state.kind, state.capability) {
            (true, Some(kind), Some(capability)) => {
                let transport = self
                    .transports
                    .get(&kind)
                    .cloned()
                    .ok_or(WalletError::NotConnected)?;
                Ok((transport, capability))
            }
            _ => Err(WalletError::NotConnected),
        }
    }

    /// 获取公钥（优先使用缓存）
    pub async fn get_public_key(&self) -> Result<String, WalletError> {
        if let Some(pk) = self.state.read().await.public_key.clone() {
            return Ok(pk);
        }

        let (transport, capability) = self.current().await?;
        let public_key = fetch_public_key(transport.as_ref(), capability).await?;
        self.state.write().await.public_key = Some(public_key.clone());
        Ok(public_key)
    }

    /// 刷新余额、网络与公钥
    pub async fn refresh_account_info(&self) -> Result<WalletState, WalletError> {
        let (transport, capability) = self.current().await?;

        let balance = invoke(transport.as_ref(), capability, WalletMethod::GetBalance, json!([]))
            .await
            .and_then(|v| parse_balance("getBalance", &v))?;
        let network = fetch_network(transport.as_ref(), capability).await?;
        let public_key = fetch_public_key(transport.as_ref(), capability).await.ok();

        tracing::debug!(balance = %format_bitcoin_balance(balance), network = %network, "Account info refreshed");
        let mut state = self.state.write().await;
        state.balance = Some(balance);
        state.network = Some(network);
        if public_key.is_some() {
            state.public_key = public_key;
        }
        Ok(state.clone())
    }

    /// 签名 PSBT
    ///
    /// 接受 hex 或 base64，钱包收到的始终是 hex；返回钱包原样输出
    pub async fn sign_psbt(&self, psbt: &str) -> Result<String, AppError> {
        if !psbt_codec::is_valid_psbt(psbt) {
            return Err(AppError::invalid_psbt("Invalid PSBT format"));
        }
        let psbt_hex = psbt_codec::to_wallet_hex(psbt)?;

        let (transport, capability) = self.current().await?;
        tracing::debug!(wallet = %transport.kind(), len = psbt_hex.len(), "Signing PSBT");

        let signed = invoke(transport.as_ref(), capability, WalletMethod::SignPsbt, json!([psbt_hex]))
            .await
            .and_then(|v| expect_string("signPsbt", v))?;
        Ok(signed)
    }

    pub async fn sign_message(&self, message: &str) -> Result<String, WalletError> {
        let (transport, capability) = self.current().await?;
        let account = self.account().await.ok_or(WalletError::NotConnected)?;

        let params = match (capability, transport.kind()) {
            (WalletCapability::BitcoinNamespace, WalletKind::Unisat) => json!([message]),
            _ => json!([message, account]),
        };
        let value = invoke(transport.as_ref(), capability, WalletMethod::SignMessage, params).await?;
        expect_string("signMessage", value)
    }

    /// 钱包账户切换事件；空列表视为断开
    pub async fn handle_accounts_changed(&self, accounts: Vec<String>) {
        let Some(account) = accounts.into_iter().next() else {
            self.handle_disconnect().await;
            return;
        };

        {
            let mut state = self.state.write().await;
            if !state.connected {
                return;
            }
            tracing::info!(account = %format_bitcoin_address(&account), "Wallet account changed");
            state.account = Some(account);
            state.public_key = None;
            state.balance = None;
        }

        if let Err(e) = self.get_public_key().await {
            tracing::warn!(error = %e, "Unable to refresh public key after account change");
        }
    }

    pub async fn handle_network_changed(&self, network: String) {
        let mut state = self.state.write().await;
        if !state.connected {
            return;
        }
        tracing::info!(network = %network, "Wallet network changed");
        state.network = Some(network);
        state.balance = None;
    }

    pub async fn handle_disconnect(&self) {
        tracing::info!("Wallet reported disconnect");
        self.disconnect().await;
    }
}

async fn invoke(
    transport: &dyn WalletTransport,
    capability: WalletCapability,
    method: WalletMethod,
    params: Value,
) -> Result<Value, WalletError> {
    let kind = transport.kind();
    let name = capability
        .method_name(kind, method)
        .ok_or_else(|| WalletError::Unsupported(kind.display_name().to_string()))?;
    transport.call(capability, name, params).await
}

async fn fetch_public_key(
    transport: &dyn WalletTransport,
    capability: WalletCapability,
) -> Result<String, WalletError> {
    let value = invoke(transport, capability, WalletMethod::GetPublicKey, json!([])).await?;
    expect_string("getPublicKey", value)
}

async fn fetch_network(
    transport: &dyn WalletTransport,
    capability: WalletCapability,
) -> Result<String, WalletError> {
    let value = invoke(transport, capability, WalletMethod::GetNetwork, json!([])).await?;
    expect_string("getNetwork", value)
}
