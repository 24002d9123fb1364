//! Embedding provider seam.

use async_trait::async_trait;

use crate::error::Result;

/// Turns text into the fixed-width vectors the store indexes.
///
/// One implementation backs ingestion and querying alike, so a corpus is
/// always searched with the same geometry it was embedded with. The
/// store's index is provisioned from [`dimensions`](EmbeddingProvider::dimensions),
/// never from a hard-coded width.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, vectors returned in input order.
    ///
    /// The default calls [`embed`](EmbeddingProvider::embed) once per text
    /// and stops at the first failure. Backends with a native batch
    /// endpoint should override it.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Width of the vectors this provider produces.
    fn dimensions(&self) -> usize;
}
