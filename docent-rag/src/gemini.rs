//! Gemini-backed embedding and answer generation.
//!
//! This module is only available when the `gemini` feature is enabled.
//! It adapts the [`docent_gemini`] client to the [`EmbeddingProvider`]
//! and [`AnswerModel`] traits.

use async_trait::async_trait;
use docent_gemini::Gemini;
use tracing::debug;

use crate::embedding::EmbeddingProvider;
use crate::error::{DocentError, Result};
use crate::generation::AnswerModel;

/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";

/// Embedding width produced by [`DEFAULT_EMBEDDING_MODEL`].
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 768;

/// Default answer-generation model.
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.0-flash";

const PROVIDER: &str = "Gemini";

/// An [`EmbeddingProvider`] backed by the Gemini embedding API.
pub struct GeminiEmbedder {
    client: Gemini,
    model: String,
    dimensions: usize,
}

impl GeminiEmbedder {
    /// Create an embedder for [`DEFAULT_EMBEDDING_MODEL`].
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self::from_client(Gemini::new(api_key).map_err(|e| DocentError::Config(e.to_string()))?))
    }

    /// Create an embedder reading the API key from `GEMINI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| DocentError::Config("GEMINI_API_KEY is not set".to_string()))?;
        Self::new(api_key)
    }

    /// Wrap an existing client, e.g. one with a custom base URL.
    pub fn from_client(client: Gemini) -> Self {
        Self {
            client,
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }

    /// Use a different embedding model with the given output width.
    pub fn with_model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
        self.model = model.into();
        self.dimensions = dimensions;
        self
    }

    fn embed_err(&self, message: impl Into<String>) -> DocentError {
        DocentError::Embedding { provider: PROVIDER.to_string(), message: message.into() }
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = self
            .client
            .embed_content(&self.model, text)
            .await
            .map_err(|e| self.embed_err(e.to_string()))?;
        debug!(model = %self.model, text_len = text.len(), "embedded text");
        Ok(embedding)
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let embeddings = self
            .client
            .batch_embed(&self.model, texts)
            .await
            .map_err(|e| self.embed_err(e.to_string()))?;
        debug!(model = %self.model, batch_size = texts.len(), "embedded batch");
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// An [`AnswerModel`] backed by the Gemini generation API.
pub struct GeminiChatModel {
    client: Gemini,
    model: String,
}

impl GeminiChatModel {
    /// Create a model handle for [`DEFAULT_CHAT_MODEL`].
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self::from_client(Gemini::new(api_key).map_err(|e| DocentError::Config(e.to_string()))?))
    }

    /// Create a model handle reading the API key from `GEMINI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| DocentError::Config("GEMINI_API_KEY is not set".to_string()))?;
        Self::new(api_key)
    }

    /// Wrap an existing client, e.g. one with a custom base URL.
    pub fn from_client(client: Gemini) -> Self {
        Self { client, model: DEFAULT_CHAT_MODEL.to_string() }
    }

    /// Use a different generation model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl AnswerModel for GeminiChatModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.client.generate_content(&self.model, prompt).await.map_err(|e| {
            DocentError::Generation { model: self.model.clone(), message: e.to_string() }
        })
    }

    fn name(&self) -> &str {
        &self.model
    }
}
