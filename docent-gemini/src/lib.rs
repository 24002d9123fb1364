//! Minimal client for the Google Gemini REST API.
//!
//! Covers the three endpoints the docent pipeline needs: single and
//! batch text embedding, and text generation. Authentication uses the
//! `x-goog-api-key` header.
//!
//! ```no_run
//! # async fn run() -> Result<(), docent_gemini::GeminiError> {
//! let gemini = docent_gemini::Gemini::new("api-key")?;
//! let answer = gemini.generate_content("gemini-2.0-flash", "Say hello").await?;
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::debug;

/// Production endpoint for the `v1beta` API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Errors returned by the Gemini client.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// The HTTP request could not be sent or the body could not be read.
    #[error("request to Gemini API failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("Gemini API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The API answered 2xx but the body is missing expected fields.
    #[error("malformed Gemini response: {0}")]
    MalformedResponse(String),

    /// The client was constructed with invalid settings.
    #[error("invalid Gemini configuration: {0}")]
    Config(String),
}

/// A Gemini API client bound to one API key.
#[derive(Debug, Clone)]
pub struct Gemini {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl Gemini {
    /// Create a client for [`DEFAULT_BASE_URL`].
    ///
    /// Fails with [`GeminiError::Config`] when the key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self, GeminiError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GeminiError::Config("API key must not be empty".to_string()));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the client at a different endpoint, e.g. a mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Embed a single piece of text, returning its vector.
    pub async fn embed_content(&self, model: &str, text: &str) -> Result<Vec<f32>, GeminiError> {
        let request = EmbedContentRequest { content: Content::from_text(text) };
        let response: EmbedContentResponse =
            self.post(&format!("models/{model}:embedContent"), &request).await?;
        debug!(model, text_len = text.len(), "embedded content");
        Ok(response.embedding.values)
    }

    /// Embed several pieces of text in one request.
    ///
    /// Vectors come back in input order, one per text.
    pub async fn batch_embed(
        &self,
        model: &str,
        texts: &[&str],
    ) -> Result<Vec<Vec<f32>>, GeminiError> {
        let requests: Vec<BatchEmbedEntry> = texts
            .iter()
            .map(|text| BatchEmbedEntry {
                model: format!("models/{model}"),
                content: Content::from_text(text),
            })
            .collect();
        let response: BatchEmbedResponse = self
            .post(&format!("models/{model}:batchEmbedContents"), &BatchEmbedRequest { requests })
            .await?;
        if response.embeddings.len() != texts.len() {
            return Err(GeminiError::MalformedResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                response.embeddings.len()
            )));
        }
        debug!(model, batch_size = texts.len(), "embedded batch");
        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }

    /// Generate text from a single-turn prompt.
    pub async fn generate_content(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<String, GeminiError> {
        let request = GenerateContentRequest { contents: vec![Content::from_text(prompt)] };
        let response: GenerateContentResponse =
            self.post(&format!("models/{model}:generateContent"), &request).await?;

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| GeminiError::MalformedResponse("no candidates returned".to_string()))?;
        let text = candidate
            .content
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect::<Vec<_>>()
            .join("");
        if text.is_empty() {
            return Err(GeminiError::MalformedResponse(
                "candidate contains no text parts".to_string(),
            ));
        }
        debug!(model, prompt_len = prompt.len(), response_len = text.len(), "generated content");
        Ok(text)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, GeminiError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}/{path}", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(parsed) => parsed.error.message,
                Err(_) if body.is_empty() => status.to_string(),
                Err(_) => body,
            };
            return Err(GeminiError::Api { status: status.as_u16(), message });
        }

        Ok(response.json::<R>().await?)
    }
}

// ── Gemini API request/response types ──────────────────────────────

#[derive(Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

impl Content {
    fn from_text(text: &str) -> Self {
        Self { parts: vec![Part { text: Some(text.to_string()) }] }
    }
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Serialize)]
struct EmbedContentRequest {
    content: Content,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Serialize)]
struct BatchEmbedRequest {
    requests: Vec<BatchEmbedEntry>,
}

#[derive(Serialize)]
struct BatchEmbedEntry {
    model: String,
    content: Content,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_api_key_is_rejected() {
        assert!(matches!(Gemini::new(""), Err(GeminiError::Config(_))));
        assert!(matches!(Gemini::new("   "), Err(GeminiError::Config(_))));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let gemini = Gemini::new("key").unwrap().with_base_url("http://localhost:8080/");
        assert_eq!(gemini.base_url, "http://localhost:8080");
    }
}
