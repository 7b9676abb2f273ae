//! 请求追踪模块
//! 为每次 DID API 请求生成追踪ID，便于与服务端日志对齐

use uuid::Uuid;

/// 追踪ID请求头
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// 生成请求追踪ID
pub fn generate_request_id() -> String {
    format!("req_{}", Uuid::new_v4().simple())
}

/// 复用已有ID或生成新ID
pub fn get_or_generate_trace_id(request_id: Option<&str>) -> String {
    request_id
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("trace_{}", Uuid::new_v4().simple()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_ids() {
        assert!(generate_request_id().starts_with("req_"));
        assert_eq!(get_or_generate_trace_id(Some("abc")), "abc");
        assert!(get_or_generate_trace_id(None).starts_with("trace_"));
    }
}
