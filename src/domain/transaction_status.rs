//! DID 交易状态定义

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// DID 提交交易的链上状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DidTxStatus {
    /// 已广播，等待确认
    #[default]
    Pending,

    /// 已确认，DID 生效
    Active,

    /// 创建失败
    Failed,

    /// 更新失败
    UpdateFailed,
}

impl DidTxStatus {
    /// 获取状态描述
    pub fn description(&self) -> &'static str {
        match self {
            Self::Pending => "交易待确认",
            Self::Active => "DID 已生效",
            Self::Failed => "DID 创建失败",
            Self::UpdateFailed => "DID 更新失败",
        }
    }

    /// 是否为最终状态（停止轮询）
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// 只允许从 Pending 进入最终状态
    pub fn can_transition_to(&self, target: &Self) -> bool {
        matches!((self, target), (Self::Pending, t) if *t != Self::Pending)
    }

    /// 从字符串解析，未知状态视为 Pending
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "active" | "success" | "confirmed" => Self::Active,
            "failed" => Self::Failed,
            "update_failed" | "updatefailed" => Self::UpdateFailed,
            _ => Self::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Failed => "failed",
            Self::UpdateFailed => "update_failed",
        }
    }
}

impl fmt::Display for DidTxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for DidTxStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DidTxStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}
