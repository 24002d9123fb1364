//! In-memory vector store using cosine similarity.
//!
//! This module provides [`InMemoryVectorStore`], a vector store backed by a
//! `HashMap` protected by a `tokio::sync::RwLock`. It is suitable for
//! development, testing, and small single-process corpora.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{DocumentRecord, QueryMatch};
use crate::error::{DocentError, Result};
use crate::vectorstore::VectorStore;

/// An in-memory vector store using exact cosine-similarity scan.
///
/// All operations are async-safe via `tokio::sync::RwLock`. The dimension
/// recorded by [`provision`](VectorStore::provision) is enforced on upsert:
/// a batch with any mismatched record is rejected whole, leaving the store
/// unchanged.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    records: RwLock<HashMap<String, DocumentRecord>>,
    dimensions: RwLock<Option<usize>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn provision(&self, dimensions: usize) -> Result<()> {
        let mut dims = self.dimensions.write().await;
        match *dims {
            Some(existing) if existing != dimensions => Err(DocentError::Config(format!(
                "index already provisioned with dimension {existing}, requested {dimensions}"
            ))),
            _ => {
                *dims = Some(dimensions);
                Ok(())
            }
        }
    }

    async fn upsert(&self, records: &[DocumentRecord]) -> Result<()> {
        let dims = *self.dimensions.read().await;
        // Validate the whole batch first: a rejected batch inserts nothing.
        if let Some(expected) = dims {
            for record in records {
                if record.embedding.len() != expected {
                    return Err(DocentError::Validation(format!(
                        "embedding dimension {} does not match index dimension {expected}",
                        record.embedding.len()
                    )));
                }
            }
        }
        let mut store = self.records.write().await;
        for record in records {
            store.insert(record.id.clone(), record.clone());
        }
        Ok(())
    }

    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<QueryMatch>> {
        let store = self.records.read().await;

        let mut scored: Vec<QueryMatch> = store
            .values()
            .map(|record| {
                let score = cosine_similarity(&record.embedding, embedding);
                let mut metadata = record.metadata.clone();
                metadata.insert("text".to_string(), record.text.clone());
                QueryMatch { id: record.id.clone(), score, metadata }
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().await.len())
    }

    fn backend_name(&self) -> &str {
        "InMemory"
    }
}
