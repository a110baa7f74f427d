//! Wire types for the framework service API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use taxa_model::Association;

/// Diagnostic parameters carried in the service response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errmsg: Option<String>,
}

/// The framework service response envelope.
///
/// Every endpoint answers with this shape; `result` is endpoint-specific and
/// left opaque here. A request counts as successful only when the HTTP
/// status is 2xx AND `responseCode` is `OK`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "responseCode", default, skip_serializing_if = "Option::is_none")]
    pub response_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<ResponseParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

impl ApiResponse {
    /// An empty OK envelope, for mocks and synthesized results.
    pub fn ok() -> Self {
        Self {
            id: None,
            response_code: Some("OK".to_string()),
            params: None,
            result: None,
        }
    }

    /// Whether the application-level response code signals success.
    pub fn is_ok(&self) -> bool {
        self.response_code.as_deref() == Some("OK")
    }

    /// The server-provided error message, when present.
    pub fn error_message(&self) -> Option<&str> {
        self.params.as_ref().and_then(|p| p.errmsg.as_deref())
    }
}

/// One term's desired final association set, addressed to the service.
///
/// Carries the full target associations; the wire body serializes only
/// identifier references. The remote contract is a replacement, not a
/// delta: an empty `associations` list deletes every association the term
/// holds in this call's context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationUpdate {
    /// Code of the source term being updated
    #[serde(rename = "fromTermCode")]
    pub from_term_code: String,
    /// Framework the term belongs to
    #[serde(rename = "frameworkCode")]
    pub framework_code: String,
    /// Category the source term belongs to
    #[serde(rename = "categoryCode")]
    pub category_code: String,
    /// The complete intended association set
    pub associations: Vec<Association>,
}

/// Outcome of one update within a batch.
///
/// Exactly one of `result` / `error` is populated; failures are captured
/// here rather than thrown so a batch always settles with one record per
/// input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequestResult {
    /// The update this result belongs to
    pub input: AssociationUpdate,
    /// Whether the update succeeded
    pub success: bool,
    /// Service response, when successful
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ApiResponse>,
    /// Error message, when failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Round-trip duration in ms
    pub duration_ms: u64,
    /// When the update settled
    pub timestamp: DateTime<Utc>,
}

impl BatchRequestResult {
    /// Record a successful update.
    pub fn success(input: AssociationUpdate, result: ApiResponse, duration_ms: u64) -> Self {
        Self {
            input,
            success: true,
            result: Some(result),
            error: None,
            duration_ms,
            timestamp: Utc::now(),
        }
    }

    /// Record a failed update.
    pub fn failure(input: AssociationUpdate, error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            input,
            success: false,
            result: None,
            error: Some(error.into()),
            duration_ms,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_success_requires_ok_code() {
        let envelope: ApiResponse = serde_json::from_str(
            r#"{"id": "api.term.update", "responseCode": "OK", "result": {"node_id": "t1"}}"#,
        )
        .unwrap();
        assert!(envelope.is_ok());

        let rejected: ApiResponse = serde_json::from_str(
            r#"{"responseCode": "CLIENT_ERROR", "params": {"errmsg": "Invalid term"}}"#,
        )
        .unwrap();
        assert!(!rejected.is_ok());
        assert_eq!(rejected.error_message(), Some("Invalid term"));
    }

    #[test]
    fn test_envelope_without_response_code_is_not_ok() {
        let envelope: ApiResponse = serde_json::from_str(r#"{"result": {}}"#).unwrap();
        assert!(!envelope.is_ok());
        assert_eq!(envelope.error_message(), None);
    }

    #[test]
    fn test_batch_result_constructors() {
        let input = AssociationUpdate {
            from_term_code: "t1".to_string(),
            framework_code: "fw".to_string(),
            category_code: "cat-a".to_string(),
            associations: Vec::new(),
        };

        let ok = BatchRequestResult::success(input.clone(), ApiResponse::ok(), 12);
        assert!(ok.success);
        assert!(ok.error.is_none());

        let failed = BatchRequestResult::failure(input, "connection reset", 3);
        assert!(!failed.success);
        assert!(failed.result.is_none());
        assert_eq!(failed.error.as_deref(), Some("connection reset"));
    }
}
