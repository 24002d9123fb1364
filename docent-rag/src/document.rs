//! Data types for ingested records, retrieval matches, and chat responses.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A unit of ingested knowledge: normalized text, provenance metadata, and
/// the embedding of the text.
///
/// Records are immutable once stored. Their ids are derived deterministically
/// (see [`record_id`]), so re-ingesting identical content supersedes the
/// stored record instead of duplicating it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentRecord {
    /// Stable identifier, a lowercase hex SHA-256 digest.
    pub id: String,
    /// Normalized plain-text content. Never empty for a stored record.
    pub text: String,
    /// Key-value metadata: provenance plus original per-column values.
    pub metadata: HashMap<String, String>,
    /// Embedding of `text`, dimensionality fixed by the embedding provider.
    pub embedding: Vec<f32>,
}

impl DocumentRecord {
    /// Create a record with its id derived from the given seed.
    pub fn new(
        id_seed: &str,
        text: impl Into<String>,
        metadata: HashMap<String, String>,
        embedding: Vec<f32>,
    ) -> Self {
        Self { id: record_id(id_seed), text: text.into(), metadata, embedding }
    }
}

/// One match returned by a vector store query.
///
/// `metadata` carries everything the store persisted for the record,
/// including its text under the `"text"` key, so a match can be rehydrated
/// without a second lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryMatch {
    /// The matched record's id.
    pub id: String,
    /// Cosine similarity to the query vector, higher is more relevant.
    pub score: f32,
    /// The stored metadata, text included.
    pub metadata: HashMap<String, String>,
}

/// One retrieved passage cited by a [`ChatResponse`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceMatch {
    /// The cited passage text.
    pub text: String,
    /// Cosine similarity of this passage to the query.
    pub score: f32,
    /// Record metadata with the text field removed.
    pub metadata: HashMap<String, String>,
}

/// A grounded answer with its provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The generated answer text.
    pub answer: String,
    /// Retrieved passages in rank order, most relevant first.
    pub sources: Vec<SourceMatch>,
    /// Arithmetic mean of the source scores, `0.0` when nothing was retrieved.
    ///
    /// A retrieval-quality proxy, not a calibrated probability.
    pub confidence: f32,
    /// When the response was produced.
    pub timestamp: DateTime<Utc>,
    /// The question that was asked.
    pub query: String,
}

/// Derive a stable record id from a seed string.
///
/// Returns the lowercase hex SHA-256 digest of the seed. Ingestion seeds
/// rows with `"{file_name}:{row_index}"`, articles with their URL, and
/// incremental additions with the text itself, so identical input always
/// maps to the same id across runs.
pub fn record_id(seed: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hex::encode(hasher.finalize())
}
