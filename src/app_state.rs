use std::sync::Arc;

use crate::{
    config::Config,
    infrastructure::preference_store::PreferenceStore,
    service::{
        did_api::{DidApi, DidApiClient},
        did_workflow::DidWorkflow,
        operation_tracker::DidOperationTracker,
        tx_monitor::TransactionMonitor,
        wallet::{WalletManager, WalletTransport},
    },
};

/// 应用状态
/// 包含所有共享资源，钱包与 DID API 均由调用方注入
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub api: Arc<dyn DidApi>,
    pub wallet: Arc<WalletManager>,
    pub tracker: Arc<DidOperationTracker>,
    pub workflow: Arc<DidWorkflow>,
    pub monitor: Arc<TransactionMonitor>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        api: Arc<dyn DidApi>,
        transports: Vec<Arc<dyn WalletTransport>>,
    ) -> Self {
        let preferences = PreferenceStore::new(config.wallet.preference_path.clone());
        let wallet = Arc::new(WalletManager::new(
            transports,
            preferences,
            config.wallet.network,
        ));
        let tracker = Arc::new(DidOperationTracker::new());
        let workflow = Arc::new(DidWorkflow::new(
            api.clone(),
            wallet.clone(),
            tracker.clone(),
        ));
        let monitor = Arc::new(TransactionMonitor::new(
            api.clone(),
            tracker.clone(),
            &config.monitor,
        ));

        Self {
            config,
            api,
            wallet,
            tracker,
            workflow,
            monitor,
        }
    }

    /// 使用 HTTP 客户端访问配置中的 DID API
    pub fn from_config(
        config: Arc<Config>,
        transports: Vec<Arc<dyn WalletTransport>>,
    ) -> anyhow::Result<Self> {
        let api: Arc<dyn DidApi> = Arc::new(DidApiClient::new(&config.api)?);
        tracing::info!(
            base_url = %config.api.base_url,
            environment = ?config.api.environment,
            "DID API client initialized"
        );
        Ok(Self::new(config, api, transports))
    }
}
