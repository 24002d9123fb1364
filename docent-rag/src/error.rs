//! Error types for the `docent-rag` crate.

use thiserror::Error;

/// Errors that can occur while ingesting or answering.
///
/// Collaborator failures ([`Embedding`](DocentError::Embedding),
/// [`VectorStore`](DocentError::VectorStore),
/// [`Generation`](DocentError::Generation), [`Scrape`](DocentError::Scrape))
/// name the service that failed, so callers can tell a low-confidence answer
/// (an `Ok` response with a small confidence score) apart from a failed one.
/// Zero retrieved matches is never an error.
#[derive(Debug, Error)]
pub enum DocentError {
    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStore {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during answer generation.
    #[error("Generation error ({model}): {message}")]
    Generation {
        /// The answer model that produced the error.
        model: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred while fetching or extracting a webpage.
    #[error("Scrape error ({url}): {message}")]
    Scrape {
        /// The page that failed.
        url: String,
        /// A description of the failure.
        message: String,
    },

    /// A unit of input was rejected (empty text, dimension mismatch).
    #[error("Validation error: {0}")]
    Validation(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O error while reading or writing local files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A tabular file could not be parsed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// A convenience result type for docent operations.
pub type Result<T> = std::result::Result<T, DocentError>;
