//! HTTP client for the framework service REST API.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use taxa_model::Framework;

use crate::api::AssociationApi;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::types::{ApiResponse, AssociationUpdate};

/// HTTP client for the framework service.
///
/// All requests carry the tenant id, bearer token, and session cookie from
/// the [`ClientConfig`] as default headers. Responses are unwrapped from the
/// service envelope; a request only counts as successful when the HTTP
/// status is 2xx and the envelope's `responseCode` is `OK`.
///
/// # Example
///
/// ```rust,no_run
/// use taxa_client::{ClientConfig, FrameworkClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = FrameworkClient::new(ClientConfig::new(
///     "https://framework.example.org",
///     "tenant-1",
///     "token-abc",
///     "connect.sid=s1",
/// ))?;
///
/// let framework = client.get_framework("fw-competencies").await?;
/// println!("{} categories", framework.categories.len());
/// # Ok(())
/// # }
/// ```
pub struct FrameworkClient {
    config: ClientConfig,
    http: Client,
}

impl FrameworkClient {
    /// Create a client from the given config.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            "tenantId",
            header::HeaderValue::from_str(&config.tenant_id)
                .map_err(|e| ClientError::Config(format!("Invalid tenant id: {}", e)))?,
        );
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", config.auth_token))
                .map_err(|e| ClientError::Config(format!("Invalid auth token: {}", e)))?,
        );
        headers.insert(
            header::COOKIE,
            header::HeaderValue::from_str(&config.cookie)
                .map_err(|e| ClientError::Config(format!("Invalid cookie: {}", e)))?,
        );

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    /// Create a client from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    // ==================== Framework API ====================

    /// Fetch a full framework hierarchy by code.
    pub async fn get_framework(&self, framework_code: &str) -> Result<Framework> {
        let url = format!(
            "{}/api/framework/v1/read/{}",
            self.config.base_url,
            urlencoding::encode(framework_code)
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let envelope = self.handle_envelope(response).await?;
        let framework = envelope
            .result
            .as_ref()
            .and_then(|r| r.get("framework"))
            .cloned()
            .ok_or_else(|| {
                ClientError::InvalidResponse("Missing framework in read response".to_string())
            })?;

        serde_json::from_value(framework)
            .map_err(|e| ClientError::InvalidResponse(format!("Malformed framework: {}", e)))
    }

    /// Update a term's description and/or label.
    ///
    /// Only the provided fields travel; associations are untouched.
    pub async fn update_term_metadata(
        &self,
        term_code: &str,
        framework_code: &str,
        category_code: &str,
        description: Option<String>,
        label: Option<String>,
        channel_id: Option<&str>,
    ) -> Result<ApiResponse> {
        let body = TermUpdateRequest {
            request: TermUpdateBody {
                term: TermPatch {
                    associations: None,
                    description,
                    label,
                },
            },
        };

        let mut request = self
            .http
            .patch(self.term_update_url(term_code))
            .query(&[("framework", framework_code), ("category", category_code)])
            .json(&body);
        if let Some(channel) = channel_id {
            request = request.header("X-Channel-Id", channel);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        self.handle_envelope(response).await
    }

    // ==================== Helper Methods ====================

    fn term_update_url(&self, term_code: &str) -> String {
        format!(
            "{}/api/framework/v1/term/update/{}",
            self.config.base_url,
            urlencoding::encode(term_code)
        )
    }

    /// Unwrap the service envelope, treating a non-`OK` response code as a
    /// failure even on HTTP 2xx.
    async fn handle_envelope(&self, response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiResponse>(&body)
                .ok()
                .and_then(|envelope| envelope.error_message().map(str::to_string))
                .unwrap_or(body);
            return Err(ClientError::RequestFailed {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: ApiResponse = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

        if !envelope.is_ok() {
            return Err(ClientError::RequestFailed {
                status: status.as_u16(),
                message: envelope
                    .error_message()
                    .unwrap_or("request rejected by framework service")
                    .to_string(),
            });
        }

        Ok(envelope)
    }
}

// The service nests every payload under `request`, and terms reference
// associations by identifier only.

#[derive(Debug, Serialize)]
struct TermUpdateRequest {
    request: TermUpdateBody,
}

#[derive(Debug, Serialize)]
struct TermUpdateBody {
    term: TermPatch,
}

#[derive(Debug, Serialize)]
struct TermPatch {
    // An empty list must reach the wire (it clears the term's associations),
    // so absence is modeled with Option rather than skipping empty vecs.
    #[serde(skip_serializing_if = "Option::is_none")]
    associations: Option<Vec<AssociationRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
}

#[derive(Debug, Serialize)]
struct AssociationRef {
    identifier: String,
}

#[async_trait]
impl AssociationApi for FrameworkClient {
    async fn replace_term_associations(&self, update: &AssociationUpdate) -> Result<ApiResponse> {
        debug!(
            term = %update.from_term_code,
            count = update.associations.len(),
            "Updating term associations"
        );

        let body = TermUpdateRequest {
            request: TermUpdateBody {
                term: TermPatch {
                    associations: Some(
                        update
                            .associations
                            .iter()
                            .map(|a| AssociationRef {
                                identifier: a.identifier.clone(),
                            })
                            .collect(),
                    ),
                    description: None,
                    label: None,
                },
            },
        };

        let response = self
            .http
            .patch(self.term_update_url(&update.from_term_code))
            .query(&[
                ("framework", update.framework_code.as_str()),
                ("category", update.category_code.as_str()),
            ])
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        self.handle_envelope(response).await
    }

    async fn publish_framework(
        &self,
        framework_code: &str,
        reason: &str,
        channel_id: Option<&str>,
    ) -> Result<ApiResponse> {
        debug!(framework = %framework_code, reason, "Publishing framework");

        let url = format!(
            "{}/api/framework/v1/publish/{}",
            self.config.base_url,
            urlencoding::encode(framework_code)
        );

        let mut request = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "request": {} }));
        if let Some(channel) = channel_id {
            request = request.header("X-Channel-Id", channel);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        self.handle_envelope(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use taxa_model::Association;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> FrameworkClient {
        FrameworkClient::new(ClientConfig::new(
            base_url,
            "tenant-1",
            "token-abc",
            "connect.sid=s1",
        ))
        .unwrap()
    }

    fn association(identifier: &str) -> Association {
        Association {
            name: format!("Term {}", identifier),
            identifier: identifier.to_string(),
            code: format!("code-{}", identifier),
            category: "cat-b".to_string(),
            status: "Live".to_string(),
            description: None,
            index: None,
        }
    }

    fn update_for(term: &str, associations: Vec<Association>) -> AssociationUpdate {
        AssociationUpdate {
            from_term_code: term.to_string(),
            framework_code: "fw-1".to_string(),
            category_code: "cat-a".to_string(),
            associations,
        }
    }

    fn ok_envelope() -> serde_json::Value {
        json!({
            "id": "api.term.update",
            "responseCode": "OK",
            "result": { "identifier": "t1" }
        })
    }

    #[tokio::test]
    async fn test_replace_associations_request_shape() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/api/framework/v1/term/update/t1"))
            .and(query_param("framework", "fw-1"))
            .and(query_param("category", "cat-a"))
            .and(header("tenantId", "tenant-1"))
            .and(header("Authorization", "Bearer token-abc"))
            .and(body_json(json!({
                "request": {
                    "term": {
                        "associations": [
                            { "identifier": "id-5" },
                            { "identifier": "id-6" }
                        ]
                    }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope()))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let update = update_for("t1", vec![association("id-5"), association("id-6")]);

        let envelope = client.replace_term_associations(&update).await.unwrap();
        assert!(envelope.is_ok());
    }

    #[tokio::test]
    async fn test_empty_association_list_reaches_the_wire() {
        let server = MockServer::start().await;

        // Clearing a term's associations sends an explicit empty array.
        Mock::given(method("PATCH"))
            .and(path("/api/framework/v1/term/update/t1"))
            .and(body_json(json!({
                "request": { "term": { "associations": [] } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope()))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let envelope = client
            .replace_term_associations(&update_for("t1", Vec::new()))
            .await
            .unwrap();
        assert!(envelope.is_ok());
    }

    #[tokio::test]
    async fn test_rejected_envelope_is_request_failed() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "responseCode": "CLIENT_ERROR",
                "params": { "errmsg": "Term is not live" }
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client
            .replace_term_associations(&update_for("t1", Vec::new()))
            .await;

        match result {
            Err(ClientError::RequestFailed { status, message }) => {
                assert_eq!(status, 200);
                assert_eq!(message, "Term is not live");
            }
            other => panic!("expected request failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_error_surfaces_status_and_errmsg() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "responseCode": "SERVER_ERROR",
                "params": { "errmsg": "Internal error" }
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client
            .replace_term_associations(&update_for("t1", Vec::new()))
            .await;

        match result {
            Err(ClientError::RequestFailed { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "Internal error");
            }
            other => panic!("expected request failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_framework_unwraps_result() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/framework/v1/read/fw-1"))
            .and(header("Cookie", "connect.sid=s1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "responseCode": "OK",
                "result": {
                    "framework": {
                        "code": "fw-1",
                        "name": "Competency Framework",
                        "status": "Live",
                        "categories": [
                            { "code": "cat-a", "name": "Ability", "status": "Live" }
                        ]
                    }
                }
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let framework = client.get_framework("fw-1").await.unwrap();

        assert_eq!(framework.code, "fw-1");
        assert_eq!(framework.categories.len(), 1);
        assert_eq!(framework.categories[0].code, "cat-a");
    }

    #[tokio::test]
    async fn test_get_framework_without_payload_is_invalid_response() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "responseCode": "OK",
                "result": {}
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client.get_framework("fw-1").await;

        assert!(matches!(result, Err(ClientError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_publish_sends_channel_header() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/framework/v1/publish/fw-1"))
            .and(header("X-Channel-Id", "channel-9"))
            .and(body_json(json!({ "request": {} })))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope()))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let envelope = client
            .publish_framework("fw-1", "association updates", Some("channel-9"))
            .await
            .unwrap();
        assert!(envelope.is_ok());
    }

    #[tokio::test]
    async fn test_update_term_metadata_sends_only_given_fields() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/api/framework/v1/term/update/t1"))
            .and(query_param("framework", "fw-1"))
            .and(query_param("category", "cat-a"))
            .and(body_json(json!({
                "request": { "term": { "description": "Updated text" } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope()))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let envelope = client
            .update_term_metadata(
                "t1",
                "fw-1",
                "cat-a",
                Some("Updated text".to_string()),
                None,
                None,
            )
            .await
            .unwrap();
        assert!(envelope.is_ok());
    }

    #[tokio::test]
    async fn test_batch_hits_every_term_then_publishes() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/api/framework/v1/term/update/t1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/api/framework/v1/term/update/t2"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "responseCode": "SERVER_ERROR",
                "params": { "errmsg": "boom" }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/framework/v1/publish/fw-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope()))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let updates = vec![
            update_for("t1", vec![association("id-5")]),
            update_for("t2", Vec::new()),
        ];

        let results = client
            .batch_replace_associations(&updates, None)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].success);
        assert!(!results[1].success);
        assert!(results[1].error.as_deref().unwrap_or("").contains("boom"));
    }
}
