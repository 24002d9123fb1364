//! Retrieval-augmented answering over a private corpus.
//!
//! This crate provides:
//! - Tabular and scraped-page ingestion into a vector store
//! - Top-k cosine retrieval with grounded prompt assembly
//! - A [`Responder`] that packages answers with sources and a confidence score
//! - An in-memory store for tests plus a Pinecone backend (`pinecone` feature)
//! - Gemini embedding/generation adapters (`gemini` feature) and a webpage
//!   scraper (`scrape` feature)

pub mod articles;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod ingest;
pub mod inmemory;
pub mod prompt;
pub mod responder;
pub mod settings;
pub mod vectorstore;

#[cfg(feature = "gemini")]
pub mod gemini;

#[cfg(feature = "pinecone")]
pub mod pinecone;

#[cfg(feature = "scrape")]
pub mod scrape;

pub use articles::{Article, ArticleSet};
pub use document::{ChatResponse, DocumentRecord, QueryMatch, SourceMatch, record_id};
pub use embedding::EmbeddingProvider;
pub use error::{DocentError, Result};
pub use generation::AnswerModel;
pub use ingest::{IngestReport, Ingestor};
pub use inmemory::InMemoryVectorStore;
pub use prompt::{DEFAULT_SYSTEM_PROMPT, assemble_prompt};
pub use responder::{Responder, ResponderBuilder, ResponderConfig};
pub use settings::Settings;
pub use vectorstore::VectorStore;

#[cfg(feature = "gemini")]
pub use gemini::{GeminiChatModel, GeminiEmbedder};

#[cfg(feature = "pinecone")]
pub use pinecone::PineconeVectorStore;

#[cfg(feature = "scrape")]
pub use scrape::ArticleScraper;
