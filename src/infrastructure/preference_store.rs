//! 钱包偏好持久化
//!
//! 只保存钱包类型（`{"walletType":"okx"}`），连接状态与账户信息不落盘

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::service::wallet::WalletKind;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredPreference {
    wallet_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取上次使用的钱包；文件不存在或钱包类型无法识别时返回 None
    pub fn load(&self) -> Result<Option<WalletKind>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read wallet preference: {:?}", self.path))?;
        let stored: StoredPreference = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse wallet preference: {:?}", self.path))?;

        Ok(stored.wallet_type.and_then(|t| match t.parse::<WalletKind>() {
            Ok(kind) => Some(kind),
            Err(e) => {
                tracing::warn!(wallet_type = %t, error = %e, "Ignoring stored wallet preference");
                None
            }
        }))
    }

    pub fn save(&self, kind: WalletKind) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create preference dir: {:?}", dir))?;
        }

        let content = serde_json::to_string(&StoredPreference {
            wallet_type: Some(kind.as_str().to_string()),
        })?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write wallet preference: {:?}", self.path))?;

        tracing::debug!(wallet = %kind, path = ?self.path, "Wallet preference saved");
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {:?}", self.path)),
        }
    }
}
