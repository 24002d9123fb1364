//! Retrieval-augmented responder.
//!
//! The [`Responder`] coordinates a single query-response pair: embed the
//! query, retrieve the nearest stored passages, assemble a grounded prompt,
//! invoke the answer model, and package the result with provenance and a
//! confidence score. It also supports incremental knowledge-base additions
//! via [`add`](Responder::add).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info};

use crate::document::{ChatResponse, DocumentRecord, SourceMatch};
use crate::embedding::EmbeddingProvider;
use crate::error::{DocentError, Result};
use crate::generation::AnswerModel;
use crate::prompt::{DEFAULT_SYSTEM_PROMPT, assemble_prompt};
use crate::vectorstore::VectorStore;

/// Configuration for the responder's retrieval defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponderConfig {
    /// How many passages to retrieve when the caller does not say.
    pub top_k: usize,
    /// Grounding instruction override applied to every call that does not
    /// carry its own.
    pub system_prompt: Option<String>,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self { top_k: 3, system_prompt: None }
    }
}

impl ResponderConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DocentError::Config`] if `top_k` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(DocentError::Config("top_k must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// The retrieval-augmented responder.
///
/// Construct one via [`Responder::builder()`]. Each call issues independent,
/// stateless requests to the embedding provider, vector store, and answer
/// model; no conversation state is held between calls.
pub struct Responder {
    config: ResponderConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    model: Arc<dyn AnswerModel>,
}

impl Responder {
    /// Create a new [`ResponderBuilder`].
    pub fn builder() -> ResponderBuilder {
        ResponderBuilder::default()
    }

    /// Return a reference to the responder configuration.
    pub fn config(&self) -> &ResponderConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Answer a question using the configured retrieval defaults.
    ///
    /// See [`respond_with`](Responder::respond_with).
    pub async fn respond(&self, query: &str) -> Result<ChatResponse> {
        self.respond_with(query, self.config.top_k, self.config.system_prompt.as_deref()).await
    }

    /// Answer a question: embed, retrieve `top_k` passages, generate.
    ///
    /// An empty corpus is not an error: the response carries no sources and
    /// a confidence of `0.0`, and the grounding instruction directs the
    /// model to acknowledge the missing context.
    ///
    /// # Errors
    ///
    /// Returns [`DocentError::Validation`] if `top_k` is zero,
    /// [`DocentError::Embedding`] if the query cannot be embedded,
    /// [`DocentError::VectorStore`] if retrieval fails, and
    /// [`DocentError::Generation`] if the answer model fails. A generation
    /// failure is never replaced with a canned answer.
    pub async fn respond_with(
        &self,
        query: &str,
        top_k: usize,
        system_prompt: Option<&str>,
    ) -> Result<ChatResponse> {
        if top_k == 0 {
            return Err(DocentError::Validation("top_k must be at least 1".to_string()));
        }

        let query_embedding = self.embedder.embed(query).await.inspect_err(|e| {
            error!(error = %e, "query embedding failed");
        })?;

        let matches =
            self.store.query(&query_embedding, top_k).await.inspect_err(|e| {
                error!(backend = self.store.backend_name(), error = %e, "retrieval failed");
            })?;
        debug!(match_count = matches.len(), top_k, "retrieved context passages");

        let passages: Vec<&str> =
            matches.iter().map(|m| m.metadata.get("text").map_or("", String::as_str)).collect();
        let prompt =
            assemble_prompt(system_prompt.unwrap_or(DEFAULT_SYSTEM_PROMPT), &passages, query);

        let answer = self.model.generate(&prompt).await.inspect_err(|e| {
            error!(model = self.model.name(), error = %e, "answer generation failed");
        })?;

        let sources: Vec<SourceMatch> = matches
            .into_iter()
            .map(|m| {
                let mut metadata = m.metadata;
                let text = metadata.remove("text").unwrap_or_default();
                SourceMatch { text, score: m.score, metadata }
            })
            .collect();
        let confidence = if sources.is_empty() {
            0.0
        } else {
            sources.iter().map(|s| s.score).sum::<f32>() / sources.len() as f32
        };

        info!(source_count = sources.len(), confidence, "generated grounded response");

        Ok(ChatResponse {
            answer,
            sources,
            confidence,
            timestamp: Utc::now(),
            query: query.to_string(),
        })
    }

    /// Add a single passage to the knowledge base.
    ///
    /// The record id is derived from the text itself, so adding identical
    /// text twice upserts the same record. Caller metadata is stored with
    /// the record; the text is folded in by the store backend.
    ///
    /// # Errors
    ///
    /// Returns [`DocentError::Validation`] for empty text. Embedding and
    /// upsert failures propagate: unlike batch ingestion, this is a single
    /// explicit action with no skip semantics.
    pub async fn add(&self, text: &str, metadata: Option<HashMap<String, String>>) -> Result<()> {
        if text.trim().is_empty() {
            return Err(DocentError::Validation("text must not be empty".to_string()));
        }

        let embedding = self.embedder.embed(text).await.inspect_err(|e| {
            error!(error = %e, "embedding failed for knowledge-base addition");
        })?;

        let record =
            DocumentRecord::new(text, text, metadata.unwrap_or_default(), embedding);
        let id = record.id.clone();
        self.store.upsert(std::slice::from_ref(&record)).await.inspect_err(|e| {
            error!(backend = self.store.backend_name(), error = %e, "upsert failed");
        })?;

        info!(id = %id, "added passage to knowledge base");
        Ok(())
    }
}

/// Builder for constructing a [`Responder`].
///
/// The embedding provider, vector store, and answer model are required;
/// the config falls back to [`ResponderConfig::default`].
#[derive(Default)]
pub struct ResponderBuilder {
    config: Option<ResponderConfig>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    store: Option<Arc<dyn VectorStore>>,
    model: Option<Arc<dyn AnswerModel>>,
}

impl ResponderBuilder {
    /// Set the retrieval configuration.
    pub fn config(mut self, config: ResponderConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the answer model.
    pub fn answer_model(mut self, model: Arc<dyn AnswerModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Build the [`Responder`], validating configuration and required fields.
    ///
    /// # Errors
    ///
    /// Returns [`DocentError::Config`] if a required component is missing
    /// or the configuration is invalid.
    pub fn build(self) -> Result<Responder> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let embedder = self
            .embedder
            .ok_or_else(|| DocentError::Config("embedding_provider is required".to_string()))?;
        let store = self
            .store
            .ok_or_else(|| DocentError::Config("vector_store is required".to_string()))?;
        let model = self
            .model
            .ok_or_else(|| DocentError::Config("answer_model is required".to_string()))?;

        Ok(Responder { config, embedder, store, model })
    }
}
