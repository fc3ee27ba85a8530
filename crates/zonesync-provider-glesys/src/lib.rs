// # GleSYS DNS Transport
//
// This crate provides the GleSYS DNS API transport for zonesync.
//
// ## Behavior
//
// - One HTTP request per transport call
// - Full error propagation to the engine (the engine owns rollback)
// - HTTP timeout configured (30 seconds by default)
// - Specific error messages for HTTP status codes (401, 403, 404, 429, 5xx)
// - NO retry logic (a failure must reach the engine immediately)
// - NO caching (the provider is the source of truth)
//
// ## Security Requirements
//
// - The API key NEVER appears in logs or `Debug` output
// - The transport fails fast if project or API key is empty
//
// ## API Reference
//
// Every call is a JSON `POST` with basic auth (project, API key):
//
// - `domain/listrecords`  `{"domainname"}`                      -> `{"response": {"records": [..]}}`
// - `domain/addrecord`    `{"domainname","host","type","data","ttl"}` -> `{"response": {"record": {..}}}`
// - `domain/updaterecord` `{"recordid","host","type","data","ttl"}`   -> `{"response": {"record": {..}}}`
// - `domain/deleterecord` `{"recordid"}`

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use zonesync_core::config::ProviderConfig;
use zonesync_core::traits::{ProviderTransport, TransportFactory};
use zonesync_core::{Error, ProviderRecord, RecordDraft, RecordId, Result};

/// GleSYS API base URL
pub const GLESYS_API_BASE: &str = "https://api.glesys.com";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("zonesync-glesys/", env!("CARGO_PKG_VERSION"));

const TRANSPORT_NAME: &str = "glesys";

/// GleSYS DNS transport
///
/// Stateless and single-shot. Ordering, matching and rollback are owned by
/// `SyncEngine`.
pub struct GlesysTransport {
    /// Project (account) name, the basic-auth user
    project: String,

    /// API key, the basic-auth password
    /// ⚠️ NEVER log this value
    api_key: String,

    /// API base URL without trailing slash
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for GlesysTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlesysTransport")
            .field("project", &self.project)
            .field("api_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GlesysTransport {
    /// Create a transport against the public GleSYS API
    pub fn new(project: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        Self::with_endpoint(project, api_key, GLESYS_API_BASE, DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a transport with a custom base URL and timeout
    ///
    /// # Errors
    ///
    /// Returns a configuration error if project or API key is empty, or if
    /// the HTTP client cannot be built.
    pub fn with_endpoint(
        project: impl Into<String>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let project = project.into();
        let api_key = api_key.into();

        if project.is_empty() {
            return Err(Error::config("GleSYS project cannot be empty"));
        }
        if api_key.is_empty() {
            return Err(Error::config("GleSYS API key cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            project,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// POST `body` to `endpoint` and decode the `response` member of the reply
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /<endpoint>
    /// Authorization: Basic <project:api_key>
    /// Content-Type: application/json
    /// ```
    async fn post<B, T>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.project, Some(&self.api_key))
            .json(body)
            .send()
            .await
            .map_err(|e| Error::transport(TRANSPORT_NAME, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            let detail = status_text(&error_text).unwrap_or(error_text);

            return Err(match status.as_u16() {
                401 | 403 => Error::transport(
                    TRANSPORT_NAME,
                    format!(
                        "Authentication failed: Invalid project or API key, or insufficient permissions. Status: {} - {}",
                        status, detail
                    ),
                ),
                404 => Error::transport(
                    TRANSPORT_NAME,
                    format!("Not found: {} - {}", endpoint, detail),
                ),
                429 => Error::transport(
                    TRANSPORT_NAME,
                    format!("Rate limit exceeded. Status: {}", status),
                ),
                500..=599 => Error::transport(
                    TRANSPORT_NAME,
                    format!("GleSYS server error: {} - {}", status, detail),
                ),
                _ => Error::transport(
                    TRANSPORT_NAME,
                    format!("{} failed: {} - {}", endpoint, status, detail),
                ),
            });
        }

        let envelope: Envelope<T> = response.json().await.map_err(|e| {
            Error::transport(TRANSPORT_NAME, format!("Failed to parse response: {}", e))
        })?;
        Ok(envelope.response)
    }
}

#[async_trait]
impl ProviderTransport for GlesysTransport {
    async fn list_records(&self, zone: &str) -> Result<Vec<ProviderRecord>> {
        let body: RecordsBody = self
            .post(
                "domain/listrecords",
                &ListParams {
                    domainname: zone.to_string(),
                },
            )
            .await?;

        tracing::debug!("Listed {} record(s) in {}", body.records.len(), zone);
        Ok(body.records.into_iter().map(ProviderRecord::from).collect())
    }

    async fn add_record(&self, draft: &RecordDraft) -> Result<ProviderRecord> {
        let params = AddParams {
            domainname: draft.zone.clone(),
            host: draft.host.clone(),
            rtype: draft.rtype.clone(),
            data: draft.data.clone(),
            ttl: draft.ttl,
        };
        let body: RecordBody = self.post("domain/addrecord", &params).await?;
        Ok(body.record.into())
    }

    async fn update_record(&self, record: &ProviderRecord) -> Result<ProviderRecord> {
        let params = UpdateParams {
            recordid: record.id.0,
            host: record.host.clone(),
            rtype: record.rtype.clone(),
            data: record.data.clone(),
            ttl: record.ttl,
        };
        let body: RecordBody = self.post("domain/updaterecord", &params).await?;
        Ok(body.record.into())
    }

    async fn delete_record(&self, id: RecordId) -> Result<()> {
        let _: serde_json::Value = self
            .post("domain/deleterecord", &DeleteParams { recordid: id.0 })
            .await?;
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        TRANSPORT_NAME
    }
}

/// Outer `{"response": ...}` wrapper of every GleSYS reply
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    response: T,
}

#[derive(Debug, Deserialize)]
struct RecordsBody {
    records: Vec<WireRecord>,
}

#[derive(Debug, Deserialize)]
struct RecordBody {
    record: WireRecord,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: ApiStatus,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    #[serde(default)]
    text: String,
}

/// A DNS record as the GleSYS API spells it
#[derive(Debug, Deserialize)]
struct WireRecord {
    domainname: String,
    recordid: u64,
    host: String,
    #[serde(rename = "type")]
    rtype: String,
    data: String,
    ttl: u32,
}

impl From<WireRecord> for ProviderRecord {
    fn from(r: WireRecord) -> Self {
        ProviderRecord {
            id: RecordId(r.recordid),
            zone: r.domainname,
            host: r.host,
            rtype: r.rtype,
            data: r.data,
            ttl: r.ttl,
        }
    }
}

#[derive(Debug, Serialize)]
struct ListParams {
    domainname: String,
}

#[derive(Debug, Serialize)]
struct AddParams {
    domainname: String,
    host: String,
    #[serde(rename = "type")]
    rtype: String,
    data: String,
    #[serde(skip_serializing_if = "is_zero")]
    ttl: u32,
}

// Empty fields are left out so the API keeps the stored value.
#[derive(Debug, Serialize)]
struct UpdateParams {
    recordid: u64,
    #[serde(skip_serializing_if = "String::is_empty")]
    host: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    rtype: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    data: String,
    #[serde(skip_serializing_if = "is_zero")]
    ttl: u32,
}

#[derive(Debug, Serialize)]
struct DeleteParams {
    recordid: u64,
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

/// Extract `response.status.text` from an error body
fn status_text(body: &str) -> Option<String> {
    serde_json::from_str::<Envelope<StatusBody>>(body)
        .ok()
        .map(|e| e.response.status.text)
        .filter(|t| !t.is_empty())
}

/// Factory for creating GleSYS transports
pub struct GlesysFactory;

impl TransportFactory for GlesysFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn ProviderTransport>> {
        match config {
            ProviderConfig::Glesys {
                project,
                api_key,
                base_url,
                timeout_secs,
            } => {
                let transport = GlesysTransport::with_endpoint(
                    project.clone(),
                    api_key.clone(),
                    base_url.clone(),
                    Duration::from_secs(*timeout_secs),
                )?;
                tracing::debug!("Created {:?}", transport);
                Ok(Box::new(transport))
            }
        }
    }
}

/// Register the GleSYS transport with a registry
///
/// # Example
///
/// ```rust
/// use zonesync_core::TransportRegistry;
///
/// let registry = TransportRegistry::new();
/// zonesync_provider_glesys::register(&registry);
/// assert!(registry.has_transport("glesys"));
/// ```
pub fn register(registry: &zonesync_core::TransportRegistry) {
    registry.register_transport(TRANSPORT_NAME, Box::new(GlesysFactory));
}


#[cfg(test)]
mod integration_tests {
    use super::*;
    use wiremock::matchers::{basic_auth, body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_mock_transport(mock_server: &MockServer) -> GlesysTransport {
        GlesysTransport::with_endpoint(
            "cl12345",
            "testapikey",
            mock_server.uri(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn record_json(id: u64, host: &str, rtype: &str, data: &str, ttl: u32) -> serde_json::Value {
        serde_json::json!({
            "recordid": id,
            "domainname": "example.com",
            "host": host,
            "type": rtype,
            "data": data,
            "ttl": ttl
        })
    }

    #[tokio::test]
    async fn test_list_records_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/domain/listrecords"))
            .and(basic_auth("cl12345", "testapikey"))
            .and(header("user-agent", USER_AGENT))
            .and(body_json(serde_json::json!({"domainname": "example.com"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": {
                    "status": {"code": 200, "text": "OK"},
                    "records": [
                        record_json(1, "www", "A", "1.1.1.1", 3600),
                        record_json(2, "@", "MX", "10 mail.example.com", 3600)
                    ]
                }
            })))
            .mount(&mock_server)
            .await;

        let transport = create_mock_transport(&mock_server);
        let records = transport.list_records("example.com").await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, RecordId(1));
        assert_eq!(records[0].zone, "example.com");
        assert_eq!(records[0].host, "www");
        assert_eq!(records[1].rtype, "MX");
        assert_eq!(records[1].data, "10 mail.example.com");
    }

    #[tokio::test]
    async fn test_add_record_returns_assigned_id() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/domain/addrecord"))
            .and(body_json(serde_json::json!({
                "domainname": "example.com",
                "host": "_acme-challenge",
                "type": "TXT",
                "data": "token",
                "ttl": 300
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": {"record": record_json(42, "_acme-challenge", "TXT", "token", 300)}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let transport = create_mock_transport(&mock_server);
        let created = transport
            .add_record(&RecordDraft {
                zone: "example.com".to_string(),
                host: "_acme-challenge".to_string(),
                rtype: "TXT".to_string(),
                data: "token".to_string(),
                ttl: 300,
            })
            .await
            .unwrap();

        assert_eq!(created.id, RecordId(42));
        assert_eq!(created.data, "token");
    }

    #[tokio::test]
    async fn test_update_record_sends_id_and_fields() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/domain/updaterecord"))
            .and(body_json(serde_json::json!({
                "recordid": 1,
                "host": "www",
                "type": "A",
                "data": "2.2.2.2",
                "ttl": 3600
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": {"record": record_json(1, "www", "A", "2.2.2.2", 3600)}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let transport = create_mock_transport(&mock_server);
        let updated = transport
            .update_record(&ProviderRecord {
                id: RecordId(1),
                zone: "example.com".to_string(),
                host: "www".to_string(),
                rtype: "A".to_string(),
                data: "2.2.2.2".to_string(),
                ttl: 3600,
            })
            .await
            .unwrap();

        assert_eq!(updated.id, RecordId(1));
        assert_eq!(updated.data, "2.2.2.2");
    }

    #[tokio::test]
    async fn test_delete_record() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/domain/deleterecord"))
            .and(body_json(serde_json::json!({"recordid": 42})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": {"status": {"code": 200, "text": "OK"}}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let transport = create_mock_transport(&mock_server);
        transport.delete_record(RecordId(42)).await.unwrap();
    }

    #[tokio::test]
    async fn test_authentication_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/domain/listrecords"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "response": {"status": {"code": 401, "text": "Invalid API key"}}
            })))
            .mount(&mock_server)
            .await;

        let transport = create_mock_transport(&mock_server);
        let err = transport.list_records("example.com").await.unwrap_err();

        match err {
            Error::Transport { transport, message } => {
                assert_eq!(transport, "glesys");
                assert!(message.contains("Authentication failed"));
                assert!(message.contains("Invalid API key"));
                assert!(!message.contains("testapikey"));
            }
            other => panic!("expected a transport error, got {}", other),
        }
    }

    #[tokio::test]
    async fn test_status_code_mapping() {
        let cases: [(u16, &str); 4] = [
            (404, "Not found"),
            (429, "Rate limit exceeded"),
            (503, "GleSYS server error"),
            (400, "domain/deleterecord failed"),
        ];

        for (status, expected) in cases {
            let mock_server = MockServer::start().await;

            Mock::given(method("POST"))
                .and(path("/domain/deleterecord"))
                .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
                .mount(&mock_server)
                .await;

            let transport = create_mock_transport(&mock_server);
            let err = transport.delete_record(RecordId(1)).await.unwrap_err();
            assert!(
                err.to_string().contains(expected),
                "status {}: {}",
                status,
                err
            );
        }
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/domain/listrecords"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let transport = create_mock_transport(&mock_server);
        let err = transport.list_records("example.com").await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse response"));
    }
}
