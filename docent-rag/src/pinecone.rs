//! Pinecone vector store backend over the serverless REST API.
//!
//! This module is only available when the `pinecone` feature is enabled.
//!
//! Index management goes through the control plane; vector operations go
//! through the index's own data-plane host, resolved once on first use.
//! Each record's text is folded into its stored metadata under the
//! `"text"` key, which is also how query matches return it.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use crate::document::{DocumentRecord, QueryMatch};
use crate::error::{DocentError, Result};
use crate::vectorstore::VectorStore;

/// The default Pinecone control-plane endpoint.
const CONTROL_PLANE_URL: &str = "https://api.pinecone.io";

/// Pinecone REST API version sent with every request.
const API_VERSION: &str = "2024-07";

const API_VERSION_HEADER: &str = "X-Pinecone-API-Version";
const BACKEND: &str = "Pinecone";

/// A [`VectorStore`] backed by a Pinecone serverless index.
///
/// # Configuration
///
/// - `index_name` – the index this store reads and writes.
/// - `region` – serverless region, e.g. `us-east-1`.
/// - `cloud` – serverless cloud, defaults to `aws`.
///
/// The control-plane and data-plane URLs can be overridden for tests.
pub struct PineconeVectorStore {
    client: reqwest::Client,
    api_key: String,
    index_name: String,
    region: String,
    cloud: String,
    control_url: String,
    data_url: OnceCell<String>,
}

impl PineconeVectorStore {
    /// Create a store for the given index in the given serverless region.
    pub fn new(
        api_key: impl Into<String>,
        index_name: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            index_name: index_name.into(),
            region: region.into(),
            cloud: "aws".to_string(),
            control_url: CONTROL_PLANE_URL.to_string(),
            data_url: OnceCell::new(),
        }
    }

    /// Set the serverless cloud provider (defaults to `aws`).
    pub fn with_cloud(mut self, cloud: impl Into<String>) -> Self {
        self.cloud = cloud.into();
        self
    }

    /// Override the control-plane URL.
    pub fn with_control_url(mut self, url: impl Into<String>) -> Self {
        self.control_url = url.into();
        self
    }

    /// Override the data-plane URL, skipping host resolution.
    pub fn with_data_url(mut self, url: impl Into<String>) -> Self {
        self.data_url = OnceCell::new_with(Some(url.into()));
        self
    }

    fn store_err(&self, message: impl Into<String>) -> DocentError {
        DocentError::VectorStore { backend: BACKEND.to_string(), message: message.into() }
    }

    async fn ensure_success(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(self.store_err(format!("HTTP {status}: {body}")))
    }

    async fn describe(&self) -> Result<IndexDescription> {
        let response = self
            .client
            .get(format!("{}/indexes/{}", self.control_url, self.index_name))
            .header("Api-Key", &self.api_key)
            .header(API_VERSION_HEADER, API_VERSION)
            .send()
            .await
            .map_err(|e| self.store_err(format!("describe index failed: {e}")))?;
        let response = self.ensure_success(response).await?;
        response
            .json::<IndexDescription>()
            .await
            .map_err(|e| self.store_err(format!("failed to parse index description: {e}")))
    }

    /// The data-plane base URL, resolved from the index host on first use.
    async fn data_url(&self) -> Result<String> {
        let url = self
            .data_url
            .get_or_try_init(|| async {
                let description = self.describe().await?;
                Ok::<String, DocentError>(format!("https://{}", description.host))
            })
            .await?;
        Ok(url.clone())
    }
}

// ── Pinecone API request/response types ────────────────────────────

#[derive(Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: usize,
    metric: &'a str,
    spec: IndexSpec<'a>,
}

#[derive(Serialize)]
struct IndexSpec<'a> {
    serverless: ServerlessSpec<'a>,
}

#[derive(Serialize)]
struct ServerlessSpec<'a> {
    cloud: &'a str,
    region: &'a str,
}

#[derive(Deserialize)]
struct IndexDescription {
    dimension: usize,
    host: String,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<VectorPayload<'a>>,
}

#[derive(Serialize)]
struct VectorPayload<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: HashMap<&'a str, &'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<MatchPayload>,
}

#[derive(Deserialize)]
struct MatchPayload {
    id: String,
    score: f32,
    #[serde(default)]
    metadata: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    #[serde(default)]
    total_vector_count: usize,
}

// ── VectorStore implementation ─────────────────────────────────────

#[async_trait]
impl VectorStore for PineconeVectorStore {
    async fn provision(&self, dimensions: usize) -> Result<()> {
        let request = CreateIndexRequest {
            name: &self.index_name,
            dimension: dimensions,
            metric: "cosine",
            spec: IndexSpec {
                serverless: ServerlessSpec { cloud: &self.cloud, region: &self.region },
            },
        };

        let response = self
            .client
            .post(format!("{}/indexes", self.control_url))
            .header("Api-Key", &self.api_key)
            .header(API_VERSION_HEADER, API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.store_err(format!("create index failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            info!(index = %self.index_name, dimensions, "created index");
            return Ok(());
        }
        if status == reqwest::StatusCode::CONFLICT {
            let description = self.describe().await?;
            if description.dimension != dimensions {
                return Err(DocentError::Config(format!(
                    "index '{}' exists with dimension {}, provider produces {dimensions}",
                    self.index_name, description.dimension
                )));
            }
            debug!(index = %self.index_name, "index already exists");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        error!(index = %self.index_name, status = %status, "create index failed");
        Err(self.store_err(format!("HTTP {status}: {body}")))
    }

    async fn upsert(&self, records: &[DocumentRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let vectors: Vec<VectorPayload<'_>> = records
            .iter()
            .map(|record| {
                let mut metadata: HashMap<&str, &str> =
                    record.metadata.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
                metadata.insert("text", &record.text);
                VectorPayload { id: &record.id, values: &record.embedding, metadata }
            })
            .collect();

        let url = self.data_url().await?;
        let response = self
            .client
            .post(format!("{url}/vectors/upsert"))
            .header("Api-Key", &self.api_key)
            .header(API_VERSION_HEADER, API_VERSION)
            .json(&UpsertRequest { vectors })
            .send()
            .await
            .map_err(|e| self.store_err(format!("upsert failed: {e}")))?;
        self.ensure_success(response).await?;

        debug!(index = %self.index_name, record_count = records.len(), "upserted records");
        Ok(())
    }

    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<QueryMatch>> {
        let url = self.data_url().await?;
        let response = self
            .client
            .post(format!("{url}/query"))
            .header("Api-Key", &self.api_key)
            .header(API_VERSION_HEADER, API_VERSION)
            .json(&QueryRequest { vector: embedding, top_k, include_metadata: true })
            .send()
            .await
            .map_err(|e| self.store_err(format!("query failed: {e}")))?;
        let response = self.ensure_success(response).await?;

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| self.store_err(format!("failed to parse query response: {e}")))?;

        Ok(parsed
            .matches
            .into_iter()
            .map(|m| {
                let metadata = m
                    .metadata
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(k, v)| {
                        let value = match v {
                            serde_json::Value::String(s) => s,
                            other => other.to_string(),
                        };
                        (k, value)
                    })
                    .collect();
                QueryMatch { id: m.id, score: m.score, metadata }
            })
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        let url = self.data_url().await?;
        let response = self
            .client
            .post(format!("{url}/describe_index_stats"))
            .header("Api-Key", &self.api_key)
            .header(API_VERSION_HEADER, API_VERSION)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| self.store_err(format!("stats request failed: {e}")))?;
        let response = self.ensure_success(response).await?;

        let stats: StatsResponse = response
            .json()
            .await
            .map_err(|e| self.store_err(format!("failed to parse stats response: {e}")))?;
        Ok(stats.total_vector_count)
    }

    fn backend_name(&self) -> &str {
        BACKEND
    }
}
