//! Weaviate REST client and the [`VectorStore`] abstraction over it.
//!
//! Only the handful of endpoints the workflow needs are covered: readiness,
//! schema lookup and creation, batch object insert, and `nearText` search
//! through GraphQL. Vectorisation happens server-side via `text2vec-openai`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::config::VectorStoreConfig;
use crate::error::VectorStoreError;

/// Properties fetched for every search hit.
const SEARCH_FIELDS: &str = "text source_file heading page_number _additional { distance }";

/// A chunk of contract text as stored in the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractChunk {
    /// Chunk text.
    pub text: String,
    /// Filename of the source PDF.
    pub source_file: String,
    /// First heading in scope for the chunk, or empty.
    pub heading: String,
    /// Page of the first document item in the chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
}

/// A passage returned by a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Passage text.
    pub text: String,
    /// Filename of the source PDF.
    pub source_file: String,
    /// Section heading, or empty.
    #[serde(default)]
    pub heading: String,
    /// Page number, when stored.
    #[serde(default)]
    pub page_number: Option<u32>,
    /// Vector distance to the query (lower is closer).
    #[serde(default)]
    pub distance: Option<f64>,
}

/// Outcome of a batch insert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Objects sent to the store.
    pub submitted: usize,
    /// Objects the store reported errors for.
    pub failed: usize,
}

/// Operations the workflow needs from a vector store.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Returns whether the service reports itself ready.
    ///
    /// # Errors
    ///
    /// Returns [`VectorStoreError::Connection`] if the service is unreachable.
    async fn is_ready(&self) -> Result<bool, VectorStoreError>;

    /// Returns whether the configured collection exists.
    ///
    /// # Errors
    ///
    /// Returns a [`VectorStoreError`] on transport or status failures.
    async fn collection_exists(&self) -> Result<bool, VectorStoreError>;

    /// Creates the configured collection.
    ///
    /// # Errors
    ///
    /// Returns a [`VectorStoreError`] on transport or status failures.
    async fn create_collection(&self) -> Result<(), VectorStoreError>;

    /// Creates the collection unless it already exists.
    ///
    /// # Errors
    ///
    /// Returns a [`VectorStoreError`] on transport or status failures.
    async fn ensure_collection(&self) -> Result<(), VectorStoreError> {
        if self.collection_exists().await? {
            debug!("collection already exists");
            return Ok(());
        }
        self.create_collection().await
    }

    /// Inserts chunks in a single batch.
    ///
    /// Per-object failures are counted in the summary, not returned as errors.
    ///
    /// # Errors
    ///
    /// Returns a [`VectorStoreError`] if the batch request itself fails.
    async fn insert_many(&self, chunks: &[ContractChunk])
    -> Result<BatchSummary, VectorStoreError>;

    /// Returns up to `limit` passages semantically closest to `query`.
    ///
    /// # Errors
    ///
    /// Returns [`VectorStoreError::Query`] if the search reports errors.
    async fn near_text(&self, query: &str, limit: usize)
    -> Result<Vec<SearchHit>, VectorStoreError>;

    /// Releases the connection. Further calls fail with
    /// [`VectorStoreError::Closed`].
    fn close(&self);
}

/// Opens vector store connections on demand.
///
/// Each workflow step that touches the store opens its own connection.
pub trait StoreConnector: Send + Sync {
    /// Opens a connection.
    ///
    /// # Errors
    ///
    /// Returns [`VectorStoreError::Connection`] if the store is misconfigured.
    fn connect(&self) -> Result<Arc<dyn VectorStore>, VectorStoreError>;

    /// Human-readable location of the store for diagnostics.
    fn location(&self) -> String;
}

impl StoreConnector for VectorStoreConfig {
    fn connect(&self) -> Result<Arc<dyn VectorStore>, VectorStoreError> {
        Ok(Arc::new(WeaviateClient::connect(self)?))
    }

    fn location(&self) -> String {
        self.url.clone().unwrap_or_else(|| "<unset>".to_string())
    }
}

/// Closes a store connection when dropped, on success and failure alike.
pub struct ConnectionGuard(Arc<dyn VectorStore>);

impl ConnectionGuard {
    /// Takes ownership of closing `store`.
    #[must_use]
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self(store)
    }

    /// The guarded connection.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.0
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Trims trailing slashes and defaults a bare cluster host to `https://`.
fn normalize_base_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// [`VectorStore`] backed by a Weaviate cluster.
#[derive(Debug)]
pub struct WeaviateClient {
    base_url: String,
    class_name: String,
    http: reqwest::Client,
    closed: AtomicBool,
}

impl WeaviateClient {
    /// Builds a client for the configured cluster.
    ///
    /// No request is made; use [`VectorStore::is_ready`] to check the cluster.
    ///
    /// # Errors
    ///
    /// Returns [`VectorStoreError::Connection`] if the URL is missing or a
    /// credential cannot be sent as a header.
    pub fn connect(config: &VectorStoreConfig) -> Result<Self, VectorStoreError> {
        let url = config
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| VectorStoreError::Connection {
                message: "no cluster URL configured (set WEAVIATE_URL)".to_string(),
            })?;

        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            headers.insert(AUTHORIZATION, header_value(&format!("Bearer {key}"))?);
        }
        if let Some(key) = &config.openai_api_key {
            headers.insert("X-OpenAI-Api-Key", header_value(key)?);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            base_url: normalize_base_url(url),
            class_name: config.class_name(),
            http,
            closed: AtomicBool::new(false),
        })
    }

    /// Class name used for every request.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn ensure_open(&self) -> Result<(), VectorStoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(VectorStoreError::Closed);
        }
        Ok(())
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, VectorStoreError> {
        let response = self.http.post(self.endpoint(path)).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VectorStoreError::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        response.json().await.map_err(|e| VectorStoreError::Query {
            message: format!("unreadable response from {path}: {e}"),
        })
    }

    fn near_text_query(&self, query: &str, limit: usize) -> String {
        let concept = serde_json::to_string(query).unwrap_or_else(|_| "\"\"".to_string());
        format!(
            "{{ Get {{ {class}(nearText: {{ concepts: [{concept}] }}, limit: {limit}) {{ {SEARCH_FIELDS} }} }} }}",
            class = self.class_name,
        )
    }
}

fn header_value(value: &str) -> Result<HeaderValue, VectorStoreError> {
    HeaderValue::from_str(value).map_err(|e| VectorStoreError::Connection {
        message: format!("invalid credential header: {e}"),
    })
}

fn collection_definition(class_name: &str) -> Value {
    json!({
        "class": class_name,
        "vectorizer": "text2vec-openai",
        "moduleConfig": {
            "generative-openai": {}
        },
        "properties": [
            {"name": "text", "dataType": ["text"]},
            {"name": "source_file", "dataType": ["text"]},
            {"name": "heading", "dataType": ["text"]},
            {"name": "page_number", "dataType": ["int"]}
        ]
    })
}

/// Collects per-object error messages from a batch response.
fn batch_errors(response: &Value) -> Vec<String> {
    response
        .as_array()
        .map(|objects| {
            objects
                .iter()
                .filter_map(|object| object.pointer("/result/errors/error"))
                .filter_map(Value::as_array)
                .map(|errors| {
                    errors
                        .iter()
                        .filter_map(|e| e.get("message").and_then(Value::as_str))
                        .collect::<Vec<_>>()
                        .join("; ")
                })
                .collect()
        })
        .unwrap_or_default()
}

fn parse_hits(response: &Value, class_name: &str) -> Result<Vec<SearchHit>, VectorStoreError> {
    if let Some(errors) = response.get("errors").and_then(Value::as_array) {
        let messages: Vec<&str> = errors
            .iter()
            .filter_map(|e| e.get("message").and_then(Value::as_str))
            .collect();
        if !messages.is_empty() {
            return Err(VectorStoreError::Query {
                message: messages.join("; "),
            });
        }
    }

    let Some(objects) = response
        .get("data")
        .and_then(|d| d.get("Get"))
        .and_then(|g| g.get(class_name))
        .and_then(Value::as_array)
    else {
        return Ok(Vec::new());
    };

    objects
        .iter()
        .map(|object| {
            let mut hit: SearchHit =
                serde_json::from_value(object.clone()).map_err(|e| VectorStoreError::Query {
                    message: format!("malformed search hit: {e}"),
                })?;
            hit.distance = object
                .pointer("/_additional/distance")
                .and_then(Value::as_f64);
            Ok(hit)
        })
        .collect()
}

#[async_trait]
impl VectorStore for WeaviateClient {
    async fn is_ready(&self) -> Result<bool, VectorStoreError> {
        self.ensure_open()?;
        let response = self
            .http
            .get(self.endpoint("/v1/.well-known/ready"))
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    async fn collection_exists(&self) -> Result<bool, VectorStoreError> {
        self.ensure_open()?;
        let path = format!("/v1/schema/{}", self.class_name);
        let response = self.http.get(self.endpoint(&path)).send().await?;
        match response.status().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            status => Err(VectorStoreError::Status {
                endpoint: path,
                status,
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }

    async fn create_collection(&self) -> Result<(), VectorStoreError> {
        self.ensure_open()?;
        self.post_json("/v1/schema", &collection_definition(&self.class_name))
            .await?;
        info!(collection = %self.class_name, "created collection");
        Ok(())
    }

    async fn insert_many(
        &self,
        chunks: &[ContractChunk],
    ) -> Result<BatchSummary, VectorStoreError> {
        self.ensure_open()?;
        let objects: Vec<Value> = chunks
            .iter()
            .map(|chunk| {
                json!({
                    "class": self.class_name,
                    "properties": chunk,
                })
            })
            .collect();

        let response = self
            .post_json("/v1/batch/objects", &json!({ "objects": objects }))
            .await?;

        let errors = batch_errors(&response);
        for message in &errors {
            warn!(collection = %self.class_name, error = %message, "object insert failed");
        }

        Ok(BatchSummary {
            submitted: chunks.len(),
            failed: errors.len(),
        })
    }

    async fn near_text(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, VectorStoreError> {
        self.ensure_open()?;
        let graphql = self.near_text_query(query, limit);
        debug!(collection = %self.class_name, limit, "near_text search");
        let response = self
            .post_json("/v1/graphql", &json!({ "query": graphql }))
            .await?;
        parse_hits(&response, &self.class_name)
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!(collection = %self.class_name, "vector store connection closed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use test_case::test_case;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> WeaviateClient {
        let config = VectorStoreConfig::builder()
            .url(server.uri())
            .api_key("wv-key")
            .openai_api_key("sk-test")
            .build();
        WeaviateClient::connect(&config).unwrap_or_else(|e| panic!("connect failed: {e}"))
    }

    fn chunk(text: &str, page: Option<u32>) -> ContractChunk {
        ContractChunk {
            text: text.to_string(),
            source_file: "dcd.pdf".to_string(),
            heading: "7. Warranties".to_string(),
            page_number: page,
        }
    }

    #[test]
    fn test_connect_requires_url() {
        let config = VectorStoreConfig::builder().build();
        let result = WeaviateClient::connect(&config);
        assert!(matches!(result, Err(VectorStoreError::Connection { .. })));
    }

    #[test_case("my-cluster.c0.europe-west3.gcp.weaviate.cloud", "https://my-cluster.c0.europe-west3.gcp.weaviate.cloud" ; "bare cloud host")]
    #[test_case("https://my-cluster.weaviate.cloud", "https://my-cluster.weaviate.cloud" ; "https kept")]
    #[test_case("http://localhost:8080/", "http://localhost:8080" ; "trailing slash")]
    fn test_connect_normalizes_url(url: &str, expected: &str) {
        let config = VectorStoreConfig::builder().url(url).build();
        let client =
            WeaviateClient::connect(&config).unwrap_or_else(|e| panic!("connect failed: {e}"));
        assert_eq!(
            client.endpoint("/v1/.well-known/ready"),
            format!("{expected}/v1/.well-known/ready")
        );
    }

    #[test]
    fn test_chunk_omits_missing_page() {
        let json = serde_json::to_value(chunk("x", None)).unwrap_or_default();
        assert!(json.get("page_number").is_none());
        let json = serde_json::to_value(chunk("x", Some(2))).unwrap_or_default();
        assert_eq!(json["page_number"], 2);
    }

    #[tokio::test]
    async fn test_is_ready_sends_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/.well-known/ready"))
            .and(header("Authorization", "Bearer wv-key"))
            .and(header("X-OpenAI-Api-Key", "sk-test"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        assert!(client(&server).is_ready().await.unwrap_or(false));
    }

    #[tokio::test]
    async fn test_not_ready_on_503() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/.well-known/ready"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        assert!(!client(&server).is_ready().await.unwrap_or(true));
    }

    #[tokio::test]
    async fn test_ensure_collection_creates_when_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/schema/Contracts_business_latest_6"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/schema"))
            .and(body_string_contains("text2vec-openai"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .ensure_collection()
            .await
            .unwrap_or_else(|e| panic!("ensure_collection failed: {e}"));
    }

    #[tokio::test]
    async fn test_ensure_collection_skips_existing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/schema/Contracts_business_latest_6"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/schema"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        client(&server)
            .ensure_collection()
            .await
            .unwrap_or_else(|e| panic!("ensure_collection failed: {e}"));
    }

    #[tokio::test]
    async fn test_insert_many_counts_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/batch/objects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"result": {}},
                {"result": {"errors": {"error": [{"message": "vectorizer quota"}]}}}
            ])))
            .mount(&server)
            .await;

        let summary = client(&server)
            .insert_many(&[chunk("a", Some(1)), chunk("b", None)])
            .await
            .unwrap_or_else(|e| panic!("insert failed: {e}"));
        assert_eq!(summary, BatchSummary { submitted: 2, failed: 1 });
    }

    #[tokio::test]
    async fn test_near_text_parses_hits() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/graphql"))
            .and(body_string_contains("nearText"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"Get": {"Contracts_business_latest_6": [
                    {
                        "text": "The warranty period is 12 months.",
                        "source_file": "dcd.pdf",
                        "heading": "7. Warranties",
                        "page_number": 4,
                        "_additional": {"distance": 0.12}
                    }
                ]}}
            })))
            .mount(&server)
            .await;

        let hits = client(&server)
            .near_text("warranty", 3)
            .await
            .unwrap_or_else(|e| panic!("search failed: {e}"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source_file, "dcd.pdf");
        assert_eq!(hits[0].page_number, Some(4));
        assert!(hits[0].distance.is_some_and(|d| (d - 0.12).abs() < 1e-9));
    }

    #[tokio::test]
    async fn test_near_text_graphql_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": [{"message": "Cannot query field"}]
            })))
            .mount(&server)
            .await;

        let result = client(&server).near_text("warranty", 3).await;
        assert!(matches!(result, Err(VectorStoreError::Query { .. })));
    }

    #[tokio::test]
    async fn test_closed_client_rejects_calls() {
        let server = MockServer::start().await;
        let client = client(&server);
        client.close();
        client.close();
        assert!(matches!(client.is_ready().await, Err(VectorStoreError::Closed)));
    }

    #[test]
    fn test_query_escapes_concept() {
        let config = VectorStoreConfig::builder().url("http://localhost:8080").build();
        let client = WeaviateClient::connect(&config).unwrap_or_else(|_| unreachable!());
        let query = client.near_text_query("say \"hi\"", 2);
        assert!(query.contains(r#"concepts: ["say \"hi\""]"#));
        assert!(query.contains("Contracts_business_latest_6(nearText"));
        assert!(query.contains("limit: 2"));
    }
}
