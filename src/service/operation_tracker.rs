//! DID 操作状态跟踪
//!
//! 记录创建/更新/推送/签名各操作的进行中标记与最近错误，以及交易确认监控状态

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::domain::transaction_status::DidTxStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DidOperation {
    Create,
    Update,
    Push,
    Sign,
}

impl DidOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            DidOperation::Create => "create",
            DidOperation::Update => "update",
            DidOperation::Push => "push",
            DidOperation::Sign => "sign",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationState {
    pub in_flight: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringState {
    pub is_monitoring: bool,
    pub commit_txid: Option<String>,
    pub status: Option<DidTxStatus>,
    pub started_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerSnapshot {
    pub create: OperationState,
    pub update: OperationState,
    pub push: OperationState,
    pub sign: OperationState,
    pub monitoring: MonitoringState,
    pub success_message: Option<String>,
}

impl TrackerSnapshot {
    pub fn operation(&self, op: DidOperation) -> &OperationState {
        match op {
            DidOperation::Create => &self.create,
            DidOperation::Update => &self.update,
            DidOperation::Push => &self.push,
            DidOperation::Sign => &self.sign,
        }
    }

    fn operation_mut(&mut self, op: DidOperation) -> &mut OperationState {
        match op {
            DidOperation::Create => &mut self.create,
            DidOperation::Update => &mut self.update,
            DidOperation::Push => &mut self.push,
            DidOperation::Sign => &mut self.sign,
        }
    }

    /// 任一操作进行中
    pub fn is_busy(&self) -> bool {
        [&self.create, &self.update, &self.push, &self.sign]
            .iter()
            .any(|s| s.in_flight)
    }
}

#[derive(Debug, Default)]
pub struct DidOperationTracker {
    state: RwLock<TrackerSnapshot>,
}

impl DidOperationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> TrackerSnapshot {
        self.state.read().await.clone()
    }

    pub async fn begin(&self, op: DidOperation) {
        let mut state = self.state.write().await;
        let entry = state.operation_mut(op);
        entry.in_flight = true;
        entry.error = None;
        state.success_message = None;
    }

    pub async fn finish(&self, op: DidOperation, success_message: Option<String>) {
        let mut state = self.state.write().await;
        state.operation_mut(op).in_flight = false;
        if success_message.is_some() {
            state.success_message = success_message;
        }
    }

    pub async fn fail(&self, op: DidOperation, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(operation = op.as_str(), error = %message, "DID operation failed");
        let mut state = self.state.write().await;
        let entry = state.operation_mut(op);
        entry.in_flight = false;
        entry.error = Some(message);
    }

    pub async fn clear_error(&self, op: DidOperation) {
        self.state.write().await.operation_mut(op).error = None;
    }

    pub async fn clear_all_errors(&self) {
        let mut state = self.state.write().await;
        for op in [
            DidOperation::Create,
            DidOperation::Update,
            DidOperation::Push,
            DidOperation::Sign,
        ] {
            state.operation_mut(op).error = None;
        }
    }

    pub async fn clear_success_message(&self) {
        self.state.write().await.success_message = None;
    }

    pub async fn start_monitoring(&self, commit_txid: &str) {
        tracing::info!(commit_txid = %commit_txid, "Start monitoring DID transaction");
        self.state.write().await.monitoring = MonitoringState {
            is_monitoring: true,
            commit_txid: Some(commit_txid.to_string()),
            status: Some(DidTxStatus::Pending),
            started_at: Some(Utc::now()),
        };
    }

    pub async fn update_monitoring_status(&self, status: DidTxStatus) {
        let mut state = self.state.write().await;
        if state.monitoring.status != Some(status) {
            tracing::debug!(status = %status, "DID transaction status updated");
        }
        state.monitoring.status = Some(status);
    }

    /// 停止监控，保留最后的 txid 与状态
    pub async fn stop_monitoring(&self) {
        self.state.write().await.monitoring.is_monitoring = false;
    }

    /// 仅当仍在监控该交易时停止
    pub async fn stop_monitoring_for(&self, commit_txid: &str) {
        let mut state = self.state.write().await;
        if state.monitoring.commit_txid.as_deref() == Some(commit_txid) {
            state.monitoring.is_monitoring = false;
        }
    }

    pub async fn reset(&self) {
        *self.state.write().await = TrackerSnapshot::default();
    }
}
