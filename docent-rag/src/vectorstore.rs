//! Vector store trait for persisting and searching embedded records.

use async_trait::async_trait;

use crate::document::{DocumentRecord, QueryMatch};
use crate::error::Result;

/// A storage backend for embedded document records with similarity search.
///
/// Each store instance manages a single index. At upsert time the backend
/// folds a record's text into its stored metadata under the `"text"` key,
/// which is how [`query`](VectorStore::query) matches carry their passage
/// text back out.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Provision the index with the given dimensionality and cosine metric.
    ///
    /// Idempotent: a no-op when the index already exists with a matching
    /// configuration. Must be called once before the first upsert or query.
    async fn provision(&self, dimensions: usize) -> Result<()>;

    /// Upsert records. An existing record with the same id is replaced.
    async fn upsert(&self, records: &[DocumentRecord]) -> Result<()>;

    /// Return the `top_k` records most similar to the given embedding,
    /// ordered by descending cosine similarity. An empty index yields an
    /// empty result, not an error.
    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<QueryMatch>>;

    /// Total number of stored records.
    async fn count(&self) -> Result<usize>;

    /// A short name identifying the backend, used in logs and errors.
    fn backend_name(&self) -> &str;
}
