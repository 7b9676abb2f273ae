//! DID 交易确认监控
//!
//! 按固定间隔轮询 `/did/txStatus`，Pending 之外的状态即为最终状态

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval, sleep, MissedTickBehavior},
};

use crate::{
    config::MonitorConfig,
    domain::transaction_status::DidTxStatus,
    error::AppError,
    service::{did_api::DidApi, operation_tracker::DidOperationTracker},
};

/// tokio interval 不接受零周期
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

pub struct TransactionMonitor {
    api: Arc<dyn DidApi>,
    tracker: Arc<DidOperationTracker>,
    poll_interval: Duration,
    max_attempts: u32,
    stop_delay: Duration,
}

/// 后台监控任务句柄
pub struct MonitorHandle {
    /// 最新状态
    pub status: watch::Receiver<DidTxStatus>,
    pub task: JoinHandle<Result<DidTxStatus, AppError>>,
}

impl TransactionMonitor {
    pub fn new(
        api: Arc<dyn DidApi>,
        tracker: Arc<DidOperationTracker>,
        config: &MonitorConfig,
    ) -> Self {
        Self::with_timing(
            api,
            tracker,
            Duration::from_secs(config.poll_interval_secs),
            config.max_attempts,
            Duration::from_secs(config.stop_delay_secs),
        )
    }

    pub fn with_timing(
        api: Arc<dyn DidApi>,
        tracker: Arc<DidOperationTracker>,
        poll_interval: Duration,
        max_attempts: u32,
        stop_delay: Duration,
    ) -> Self {
        Self {
            api,
            tracker,
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
            max_attempts: max_attempts.max(1),
            stop_delay,
        }
    }

    /// 轮询直到交易进入最终状态
    pub async fn watch(&self, commit_txid: &str) -> Result<DidTxStatus, AppError> {
        self.poll(commit_txid, None).await
    }

    /// 在后台任务中轮询
    pub fn spawn(self: &Arc<Self>, commit_txid: impl Into<String>) -> MonitorHandle {
        let commit_txid = commit_txid.into();
        let (tx, rx) = watch::channel(DidTxStatus::Pending);
        let monitor = Arc::clone(self);

        let task = tokio::spawn(async move { monitor.poll(&commit_txid, Some(&tx)).await });

        MonitorHandle { status: rx, task }
    }

    async fn poll(
        &self,
        commit_txid: &str,
        status_tx: Option<&watch::Sender<DidTxStatus>>,
    ) -> Result<DidTxStatus, AppError> {
        let current = self.tracker.snapshot().await.monitoring;
        if !current.is_monitoring || current.commit_txid.as_deref() != Some(commit_txid) {
            self.tracker.start_monitoring(commit_txid).await;
        }

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            commit_txid = %commit_txid,
            interval_ms = self.poll_interval.as_millis() as u64,
            max_attempts = self.max_attempts,
            "Transaction monitor started"
        );

        for attempt in 1..=self.max_attempts {
            ticker.tick().await;

            match self.api.get_transaction_status(commit_txid).await {
                Ok(resp) => {
                    let status = resp.status;
                    self.tracker.update_monitoring_status(status).await;
                    if let Some(tx) = status_tx {
                        tx.send_replace(status);
                    }

                    if status.is_final() {
                        tracing::info!(
                            commit_txid = %commit_txid,
                            status = %status,
                            did = ?resp.did,
                            attempt,
                            "DID transaction reached final status"
                        );
                        self.schedule_stop(commit_txid).await;
                        return Ok(status);
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        commit_txid = %commit_txid,
                        attempt,
                        error = %e,
                        "Failed to query transaction status"
                    );
                }
            }
        }

        self.tracker.stop_monitoring_for(commit_txid).await;
        Err(AppError::timeout(format!(
            "transaction {} still pending after {} attempts",
            commit_txid, self.max_attempts
        )))
    }

    async fn schedule_stop(&self, commit_txid: &str) {
        if self.stop_delay.is_zero() {
            self.tracker.stop_monitoring_for(commit_txid).await;
            return;
        }

        let tracker = Arc::clone(&self.tracker);
        let delay = self.stop_delay;
        let commit_txid = commit_txid.to_string();
        tokio::spawn(async move {
            sleep(delay).await;
            tracker.stop_monitoring_for(&commit_txid).await;
        });
    }
}
