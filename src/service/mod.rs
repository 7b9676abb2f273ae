//! Service 模块
//!
//! DID API 客户端、钱包会话、签名推送流程与交易确认监控

pub mod did_api;
pub mod did_workflow;
pub mod operation_tracker;
pub mod tx_monitor;
pub mod wallet;

pub use did_api::{DidApi, DidApiClient};
pub use did_workflow::{CreateDidParams, DidSubmission, DidWorkflow, UpdateDidParams};
pub use operation_tracker::{DidOperation, DidOperationTracker, TrackerSnapshot};
pub use tx_monitor::{MonitorHandle, TransactionMonitor};
pub use wallet::{WalletCapability, WalletKind, WalletManager, WalletState, WalletTransport};
