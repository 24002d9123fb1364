//! End-to-end responder tests over an in-memory store and stub providers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use docent_rag::{
    AnswerModel, DocentError, DocumentRecord, EmbeddingProvider, InMemoryVectorStore, QueryMatch,
    Responder, ResponderConfig, Result, VectorStore,
};

/// Embedding provider that returns pre-registered vectors keyed by text.
struct StubEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    dimensions: usize,
}

impl StubEmbedder {
    fn new(dimensions: usize) -> Self {
        Self { vectors: HashMap::new(), dimensions }
    }

    fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.vectors.get(text).cloned().ok_or_else(|| DocentError::Embedding {
            provider: "Stub".to_string(),
            message: format!("no stub vector registered for {text:?}"),
        })
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Answer model that records every prompt and replies with a fixed string.
struct RecordingModel {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl RecordingModel {
    fn new(reply: &str) -> Self {
        Self { reply: reply.to_string(), prompts: Mutex::new(Vec::new()) }
    }

    fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl AnswerModel for RecordingModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "recording-stub"
    }
}

/// Vector store whose queries always fail.
struct FailingStore;

#[async_trait]
impl VectorStore for FailingStore {
    async fn provision(&self, _dimensions: usize) -> Result<()> {
        Ok(())
    }

    async fn upsert(&self, _records: &[DocumentRecord]) -> Result<()> {
        Ok(())
    }

    async fn query(&self, _embedding: &[f32], _top_k: usize) -> Result<Vec<QueryMatch>> {
        Err(DocentError::VectorStore {
            backend: "failing-stub".to_string(),
            message: "index offline".to_string(),
        })
    }

    async fn count(&self) -> Result<usize> {
        Ok(0)
    }

    fn backend_name(&self) -> &str {
        "failing-stub"
    }
}

/// Answer model that always fails.
struct FailingModel;

#[async_trait]
impl AnswerModel for FailingModel {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(DocentError::Generation {
            model: "failing-stub".to_string(),
            message: "model offline".to_string(),
        })
    }

    fn name(&self) -> &str {
        "failing-stub"
    }
}

fn metadata(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

async fn seeded_store(dimensions: usize, records: &[DocumentRecord]) -> Arc<InMemoryVectorStore> {
    let store = Arc::new(InMemoryVectorStore::new());
    store.provision(dimensions).await.unwrap();
    store.upsert(records).await.unwrap();
    store
}

#[tokio::test]
async fn respond_returns_grounded_answer_with_sources() {
    let question = "What is the capital of France?";
    let records = [
        DocumentRecord::new(
            "geo.csv:0",
            "Paris is the capital of France.",
            metadata(&[("source_file", "geo.csv")]),
            vec![1.0, 0.0],
        ),
        DocumentRecord::new(
            "geo.csv:1",
            "Berlin is the capital of Germany.",
            metadata(&[("source_file", "geo.csv")]),
            vec![0.0, 1.0],
        ),
    ];
    let store = seeded_store(2, &records).await;
    let embedder = StubEmbedder::new(2).with_vector(question, vec![1.0, 0.0]);
    let model = Arc::new(RecordingModel::new("Paris."));

    let responder = Responder::builder()
        .embedding_provider(Arc::new(embedder))
        .vector_store(store)
        .answer_model(model.clone())
        .build()
        .unwrap();

    let response = responder.respond(question).await.unwrap();

    assert_eq!(response.answer, "Paris.");
    assert_eq!(response.query, question);
    assert_eq!(response.sources.len(), 2);
    assert_eq!(response.sources[0].text, "Paris is the capital of France.");
    assert!((response.sources[0].score - 1.0).abs() < 1e-6);
    assert_eq!(
        response.sources[0].metadata.get("source_file").map(String::as_str),
        Some("geo.csv")
    );
    // Text is surfaced as its own field, not duplicated in metadata
    assert!(!response.sources[0].metadata.contains_key("text"));

    let prompt = model.last_prompt();
    assert!(prompt.contains("Document 1:\nParis is the capital of France."));
    assert!(prompt.contains("Question: What is the capital of France?"));
}

#[tokio::test]
async fn confidence_is_the_mean_of_match_scores() {
    // Unit-length embeddings whose cosines against [1, 0] are 0.95 and 0.82.
    let records = [
        DocumentRecord::new("a", "close", HashMap::new(), vec![0.95, 0.312_249_9]),
        DocumentRecord::new("b", "further", HashMap::new(), vec![0.82, 0.572_363_5]),
    ];
    let store = seeded_store(2, &records).await;
    let embedder = StubEmbedder::new(2).with_vector("q", vec![1.0, 0.0]);

    let responder = Responder::builder()
        .embedding_provider(Arc::new(embedder))
        .vector_store(store)
        .answer_model(Arc::new(RecordingModel::new("ok")))
        .build()
        .unwrap();

    let response = responder.respond("q").await.unwrap();

    assert_eq!(response.sources.len(), 2);
    assert!(response.sources[0].score >= response.sources[1].score);
    assert!((response.confidence - 0.885).abs() < 1e-3);
}

#[tokio::test]
async fn a_larger_corpus_is_capped_at_top_k_in_rank_order() {
    // Five unit-length embeddings whose cosines against [1, 0] are
    // 0.95, 0.82, 0.5, 0.3, and 0.1.
    let records = [
        DocumentRecord::new("a", "closest", HashMap::new(), vec![0.95, 0.312_249_9]),
        DocumentRecord::new("b", "runner-up", HashMap::new(), vec![0.82, 0.572_363_5]),
        DocumentRecord::new("c", "middling", HashMap::new(), vec![0.5, 0.866_025_4]),
        DocumentRecord::new("d", "distant", HashMap::new(), vec![0.3, 0.953_939_2]),
        DocumentRecord::new("e", "marginal", HashMap::new(), vec![0.1, 0.994_987_4]),
    ];
    let store = seeded_store(2, &records).await;
    let embedder = StubEmbedder::new(2).with_vector("q", vec![1.0, 0.0]);

    let responder = Responder::builder()
        .embedding_provider(Arc::new(embedder))
        .vector_store(store)
        .answer_model(Arc::new(RecordingModel::new("ok")))
        .build()
        .unwrap();

    let response = responder.respond_with("q", 2, None).await.unwrap();

    // Only the two best matches survive the cut, in rank order
    assert_eq!(response.sources.len(), 2);
    assert_eq!(response.sources[0].text, "closest");
    assert_eq!(response.sources[1].text, "runner-up");
    assert!((response.sources[0].score - 0.95).abs() < 1e-3);
    assert!((response.sources[1].score - 0.82).abs() < 1e-3);
    assert!((response.confidence - 0.885).abs() < 1e-3);
}

#[tokio::test]
async fn empty_corpus_yields_zero_confidence_and_no_sources() {
    let store = seeded_store(2, &[]).await;
    let embedder = StubEmbedder::new(2).with_vector("anything?", vec![1.0, 0.0]);
    let model = Arc::new(RecordingModel::new("I don't have context for that."));

    let responder = Responder::builder()
        .embedding_provider(Arc::new(embedder))
        .vector_store(store)
        .answer_model(model.clone())
        .build()
        .unwrap();

    let response = responder.respond("anything?").await.unwrap();

    assert!(response.sources.is_empty());
    assert_eq!(response.confidence, 0.0);
    assert_eq!(response.answer, "I don't have context for that.");

    // The model is still invoked, with an empty context section
    let prompt = model.last_prompt();
    assert!(prompt.contains("Context Information:"));
    assert!(prompt.contains("Question: anything?"));
    assert!(!prompt.contains("Document 1:"));
}

#[tokio::test]
async fn fewer_matches_than_top_k_is_not_an_error() {
    let records =
        [DocumentRecord::new("only", "the single passage", HashMap::new(), vec![1.0, 0.0])];
    let store = seeded_store(2, &records).await;
    let embedder = StubEmbedder::new(2).with_vector("q", vec![1.0, 0.0]);

    let responder = Responder::builder()
        .embedding_provider(Arc::new(embedder))
        .vector_store(store)
        .answer_model(Arc::new(RecordingModel::new("ok")))
        .build()
        .unwrap();

    let response = responder.respond_with("q", 5, None).await.unwrap();

    assert_eq!(response.sources.len(), 1);
}

#[tokio::test]
async fn embedding_failure_propagates() {
    let store = seeded_store(2, &[]).await;
    // No vector registered for the query text
    let embedder = StubEmbedder::new(2);

    let responder = Responder::builder()
        .embedding_provider(Arc::new(embedder))
        .vector_store(store)
        .answer_model(Arc::new(RecordingModel::new("ok")))
        .build()
        .unwrap();

    let result = responder.respond("q").await;

    assert!(matches!(result, Err(DocentError::Embedding { .. })));
}

#[tokio::test]
async fn retrieval_failure_propagates() {
    let embedder = StubEmbedder::new(2).with_vector("q", vec![1.0, 0.0]);

    let responder = Responder::builder()
        .embedding_provider(Arc::new(embedder))
        .vector_store(Arc::new(FailingStore))
        .answer_model(Arc::new(RecordingModel::new("ok")))
        .build()
        .unwrap();

    let result = responder.respond("q").await;

    match result {
        Err(DocentError::VectorStore { backend, .. }) => assert_eq!(backend, "failing-stub"),
        other => panic!("expected VectorStore error, got {other:?}"),
    }
}

#[tokio::test]
async fn generation_failure_propagates() {
    let store = seeded_store(2, &[]).await;
    let embedder = StubEmbedder::new(2).with_vector("q", vec![1.0, 0.0]);

    let responder = Responder::builder()
        .embedding_provider(Arc::new(embedder))
        .vector_store(store)
        .answer_model(Arc::new(FailingModel))
        .build()
        .unwrap();

    let result = responder.respond("q").await;

    match result {
        Err(DocentError::Generation { model, .. }) => assert_eq!(model, "failing-stub"),
        other => panic!("expected Generation error, got {other:?}"),
    }
}

#[tokio::test]
async fn respond_with_rejects_zero_top_k() {
    let store = seeded_store(2, &[]).await;
    let embedder = StubEmbedder::new(2).with_vector("q", vec![1.0, 0.0]);

    let responder = Responder::builder()
        .embedding_provider(Arc::new(embedder))
        .vector_store(store)
        .answer_model(Arc::new(RecordingModel::new("ok")))
        .build()
        .unwrap();

    let result = responder.respond_with("q", 0, None).await;

    assert!(matches!(result, Err(DocentError::Validation(_))));
}

#[tokio::test]
async fn custom_system_prompt_reaches_the_model() {
    let store = seeded_store(2, &[]).await;
    let embedder = StubEmbedder::new(2).with_vector("q", vec![1.0, 0.0]);
    let model = Arc::new(RecordingModel::new("ok"));

    let responder = Responder::builder()
        .config(ResponderConfig {
            top_k: 3,
            system_prompt: Some("Answer in the style of a museum guide.".to_string()),
        })
        .embedding_provider(Arc::new(embedder))
        .vector_store(store)
        .answer_model(model.clone())
        .build()
        .unwrap();

    responder.respond("q").await.unwrap();
    assert!(model.last_prompt().starts_with("Answer in the style of a museum guide."));

    // A per-call override takes precedence over the configured default
    responder.respond_with("q", 3, Some("Terse answers only.")).await.unwrap();
    assert!(model.last_prompt().starts_with("Terse answers only."));
}

#[tokio::test]
async fn add_then_respond_round_trip() {
    let passage = "Rust is a systems programming language.";
    let question = "What kind of language is Rust?";
    let store = Arc::new(InMemoryVectorStore::new());
    store.provision(2).await.unwrap();
    let embedder = StubEmbedder::new(2)
        .with_vector(passage, vec![0.6, 0.8])
        .with_vector(question, vec![0.6, 0.8]);

    let responder = Responder::builder()
        .embedding_provider(Arc::new(embedder))
        .vector_store(store.clone())
        .answer_model(Arc::new(RecordingModel::new("A systems language.")))
        .build()
        .unwrap();

    responder.add(passage, Some(metadata(&[("topic", "rust")]))).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 1);

    // Identical text maps to the same id, so re-adding does not duplicate
    responder.add(passage, None).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 1);

    let response = responder.respond(question).await.unwrap();
    assert_eq!(response.sources.len(), 1);
    assert_eq!(response.sources[0].text, passage);
    assert!((response.sources[0].score - 1.0).abs() < 1e-6);
    assert_eq!(response.sources[0].metadata.get("topic").map(String::as_str), Some("rust"));
}

#[tokio::test]
async fn add_rejects_empty_text() {
    let store = seeded_store(2, &[]).await;
    let embedder = StubEmbedder::new(2);

    let responder = Responder::builder()
        .embedding_provider(Arc::new(embedder))
        .vector_store(store.clone())
        .answer_model(Arc::new(RecordingModel::new("ok")))
        .build()
        .unwrap();

    let result = responder.add("   \n\t", None).await;

    assert!(matches!(result, Err(DocentError::Validation(_))));
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn builder_requires_all_components() {
    let missing_everything = Responder::builder().build();
    match missing_everything {
        Err(DocentError::Config(message)) => assert!(message.contains("embedding_provider")),
        other => panic!("expected Config error, got {:?}", other.map(|_| ())),
    }

    let missing_store = Responder::builder()
        .embedding_provider(Arc::new(StubEmbedder::new(2)))
        .build();
    match missing_store {
        Err(DocentError::Config(message)) => assert!(message.contains("vector_store")),
        other => panic!("expected Config error, got {:?}", other.map(|_| ())),
    }

    let missing_model = Responder::builder()
        .embedding_provider(Arc::new(StubEmbedder::new(2)))
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .build();
    match missing_model {
        Err(DocentError::Config(message)) => assert!(message.contains("answer_model")),
        other => panic!("expected Config error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn builder_rejects_invalid_config() {
    let config = ResponderConfig { top_k: 0, system_prompt: None };
    assert!(config.validate().is_err());

    let result = Responder::builder()
        .config(config)
        .embedding_provider(Arc::new(StubEmbedder::new(2)))
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .answer_model(Arc::new(RecordingModel::new("ok")))
        .build();

    assert!(matches!(result, Err(DocentError::Config(_))));
}
