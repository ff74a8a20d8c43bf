//! API response types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::ApiError;

/// Unified response type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    Ok {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<Value>,
        data: Value,
    },
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<Value>,
        code: String,
        message: String,
        retryable: bool,
    },
}

impl Response {
    pub fn success(id: Option<Value>, data: Value) -> Self {
        Response::Ok { id, data }
    }

    pub fn error(id: Option<Value>, err: &ApiError) -> Self {
        Response::Error {
            id,
            code: err.code().to_string(),
            message: err.message().to_string(),
            retryable: err.is_retryable(),
        }
    }

    /// Convert to a single-line JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"status":"error","code":"ENCODE_ERROR","message":{:?},"retryable":false}}"#,
                e.to_string()
            )
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Ok { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_response() {
        let resp = Response::success(Some(json!(1)), json!([{"filename": "sales.csv"}]));
        let json = resp.to_json();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("sales.csv"));
        assert!(resp.is_success());
    }

    #[test]
    fn test_error_response() {
        let err = ApiError::invalid_request("test error");
        let json = Response::error(None, &err).to_json();
        assert!(json.contains("\"status\":\"error\""));
        assert!(json.contains("INVALID_REQUEST"));
        assert!(!json.contains("\"id\""));
    }
}
