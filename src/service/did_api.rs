//! DID API 客户端
//!
//! 远程 DID 服务：创建/更新交易构造、交易推送、状态查询、DID 列表查询

use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    config::DidApiConfig,
    domain::did::{
        CreateDidRequest, CreateDidResponse, DidSummary, PushTxRequest, PushTxResponse,
        QueryDidRequest, QueryDidResponse, TxStatusResponse, UpdateDidRequest, UpdateDidResponse,
    },
    error::DidApiError,
    utils::error_tracking::{generate_request_id, REQUEST_ID_HEADER},
};

/// DID 服务接口（工作流通过该 trait 注入，测试使用内存实现）
#[async_trait]
pub trait DidApi: Send + Sync {
    /// DID 总数
    async fn get_summary(&self) -> Result<DidSummary, DidApiError>;

    /// 获取创建 DID 的待签名 PSBT
    async fn create_did(&self, req: &CreateDidRequest) -> Result<CreateDidResponse, DidApiError>;

    /// 获取更新 DID 的 commit/reveal PSBT
    async fn update_did(&self, req: &UpdateDidRequest) -> Result<UpdateDidResponse, DidApiError>;

    /// 推送已签名交易
    async fn push_transaction(&self, req: &PushTxRequest) -> Result<PushTxResponse, DidApiError>;

    async fn get_transaction_status(
        &self,
        commit_txid: &str,
    ) -> Result<TxStatusResponse, DidApiError>;

    async fn query_dids(&self, req: &QueryDidRequest) -> Result<QueryDidResponse, DidApiError>;
}

/// 基于 reqwest 的 DID API 实现
#[derive(Clone)]
pub struct DidApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl DidApiClient {
    pub fn new(config: &DidApiConfig) -> Result<Self, DidApiError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| DidApiError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, DidApiError> {
        let request_id = generate_request_id();
        tracing::debug!(method = "GET", path, request_id = %request_id, "Request sent");

        let resp = self
            .http_client
            .get(self.url(path))
            .header(REQUEST_ID_HEADER, &request_id)
            .query(query)
            .send()
            .await?;

        Self::handle_response("GET", path, resp).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, DidApiError> {
        let request_id = generate_request_id();
        tracing::debug!(method = "POST", path, request_id = %request_id, "Request sent");

        let resp = self
            .http_client
            .post(self.url(path))
            .header(REQUEST_ID_HEADER, &request_id)
            .json(body)
            .send()
            .await?;

        Self::handle_response("POST", path, resp).await
    }

    async fn handle_response<T: DeserializeOwned>(
        method: &str,
        path: &str,
        resp: reqwest::Response,
    ) -> Result<T, DidApiError> {
        let status = resp.status();
        tracing::debug!(method, path, status = status.as_u16(), "Response received");

        let body = resp.text().await?;

        if !status.is_success() {
            let message = error_message_from_body(&body)
                .unwrap_or_else(|| format!("request failed ({})", status.as_u16()));
            tracing::warn!(method, path, status = status.as_u16(), error = %message, "API error");
            return Err(DidApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let value: Value =
            serde_json::from_str(&body).map_err(|e| DidApiError::Decode(e.to_string()))?;
        unwrap_envelope(value)
    }
}

/// 兼容裸数据与 `{ success, data, error|message }` 包装两种响应
pub fn unwrap_envelope<T: DeserializeOwned>(value: Value) -> Result<T, DidApiError> {
    let payload = match value {
        Value::Object(mut map) if map.get("success").map(Value::is_boolean).unwrap_or(false) => {
            if map.get("success") == Some(&Value::Bool(false)) {
                let message = extract_message(&Value::Object(map))
                    .unwrap_or_else(|| "unknown error".to_string());
                return Err(DidApiError::Api(message));
            }
            match map.remove("data") {
                Some(data) => data,
                None => Value::Object(map),
            }
        }
        other => other,
    };

    serde_json::from_value(payload).map_err(|e| DidApiError::Decode(e.to_string()))
}

fn extract_message(value: &Value) -> Option<String> {
    ["message", "error", "msg"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn error_message_from_body(body: &str) -> Option<String> {
    if body.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(body) {
        Ok(value) => extract_message(&value),
        Err(_) => Some(body.trim().to_string()),
    }
}

#[async_trait]
impl DidApi for DidApiClient {
    async fn get_summary(&self) -> Result<DidSummary, DidApiError> {
        self.get("/did/summary", &[]).await
    }

    async fn create_did(&self, req: &CreateDidRequest) -> Result<CreateDidResponse, DidApiError> {
        self.post("/did/create", req).await
    }

    async fn update_did(&self, req: &UpdateDidRequest) -> Result<UpdateDidResponse, DidApiError> {
        self.post("/did/update", req).await
    }

    async fn push_transaction(&self, req: &PushTxRequest) -> Result<PushTxResponse, DidApiError> {
        let resp: PushTxResponse = self.post("/did/pushTx", req).await?;
        tracing::info!(commit_txid = %resp.commit_txid, alias = %req.alias, "Transaction pushed");
        Ok(resp)
    }

    async fn get_transaction_status(
        &self,
        commit_txid: &str,
    ) -> Result<TxStatusResponse, DidApiError> {
        self.get("/did/txStatus", &[("commitTxid", commit_txid.to_string())])
            .await
    }

    async fn query_dids(&self, req: &QueryDidRequest) -> Result<QueryDidResponse, DidApiError> {
        let mut query = Vec::with_capacity(4);
        if let Some(address) = &req.address {
            query.push(("address", address.clone()));
        }
        if let Some(public_key) = &req.public_key {
            query.push(("publicKey", public_key.clone()));
        }
        query.push(("page", req.page.to_string()));
        query.push(("pageSize", req.page_size.to_string()));

        self.get("/did/query", &query).await
    }
}
