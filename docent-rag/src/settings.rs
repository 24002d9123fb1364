//! Environment-backed settings with startup validation.

use crate::error::{DocentError, Result};

/// Index name used when `PINECONE_INDEX_NAME` is not set.
pub const DEFAULT_INDEX_NAME: &str = "chatbot-embeddings";

/// Credentials and service configuration, loaded from the environment.
///
/// Validation is all-or-nothing: every missing required variable is
/// collected and reported in a single error, and no partial operation is
/// attempted afterward. Binaries are expected to load a `.env` file (via
/// `dotenvy`) before calling [`Settings::from_env`].
#[derive(Debug, Clone)]
pub struct Settings {
    /// API key for the Gemini embedding and generation models.
    pub gemini_api_key: String,
    /// API key for the Pinecone vector store.
    pub pinecone_api_key: String,
    /// Pinecone serverless region, e.g. `us-east-1`.
    pub pinecone_environment: String,
    /// Pinecone index name, defaults to [`DEFAULT_INDEX_NAME`].
    pub pinecone_index: String,
}

impl Settings {
    /// Load settings from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`DocentError::Config`] naming every missing required
    /// variable (`GEMINI_API_KEY`, `PINECONE_API_KEY`,
    /// `PINECONE_ENVIRONMENT`).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut missing = Vec::new();
        let mut require = |name: &'static str| match get(name) {
            Some(value) if !value.is_empty() => value,
            _ => {
                missing.push(name);
                String::new()
            }
        };

        let gemini_api_key = require("GEMINI_API_KEY");
        let pinecone_api_key = require("PINECONE_API_KEY");
        let pinecone_environment = require("PINECONE_ENVIRONMENT");

        if !missing.is_empty() {
            return Err(DocentError::Config(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let pinecone_index = get("PINECONE_INDEX_NAME")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_INDEX_NAME.to_string());

        Ok(Self { gemini_api_key, pinecone_api_key, pinecone_environment, pinecone_index })
    }
}
