//! Command-line front end for the docent retrieval pipeline.
//!
//! Wires the Gemini providers and the Pinecone store into a [`Responder`]
//! and exposes chat, ingestion, scraping, and status commands. All
//! configuration comes from the environment (a `.env` file is honored).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use docent_rag::{
    ArticleScraper, ArticleSet, ChatResponse, EmbeddingProvider, GeminiChatModel, GeminiEmbedder,
    IngestReport, Ingestor, PineconeVectorStore, Responder, ResponderConfig, Settings, VectorStore,
};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docent", version, about = "Grounded question answering over your own corpus")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start an interactive chat session
    Chat {
        /// Number of context passages to retrieve per question
        #[arg(long, default_value_t = 3)]
        top_k: usize,
        /// Override the grounding instruction
        #[arg(long)]
        system_prompt: Option<String>,
    },
    /// Ingest a CSV file, or every CSV file in a directory
    Ingest {
        /// A CSV file or a directory containing CSV files
        path: PathBuf,
    },
    /// Scrape web articles and ingest them
    Scrape {
        /// Article URLs to fetch
        #[arg(required = true)]
        urls: Vec<String>,
        /// Also export the scraped articles to this CSV file
        #[arg(long)]
        export_csv: Option<PathBuf>,
        /// Also export the scraped articles to this HTML file
        #[arg(long)]
        export_html: Option<PathBuf>,
    },
    /// Add a single passage to the knowledge base
    Add {
        /// The passage text
        text: String,
        /// Metadata entries as key=value pairs
        #[arg(long = "meta", value_parser = parse_key_val)]
        metadata: Vec<(String, String)>,
    },
    /// Show knowledge-base status
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    match cli.command {
        Command::Chat { top_k, system_prompt } => chat(&settings, top_k, system_prompt).await,
        Command::Ingest { path } => ingest(&settings, &path).await,
        Command::Scrape { urls, export_csv, export_html } => {
            scrape(&settings, &urls, export_csv.as_deref(), export_html.as_deref()).await
        }
        Command::Add { text, metadata } => add(&settings, &text, metadata).await,
        Command::Status => status(&settings).await,
    }
}

/// Build the embedding provider and a provisioned vector store.
async fn build_components(
    settings: &Settings,
) -> anyhow::Result<(Arc<dyn EmbeddingProvider>, Arc<dyn VectorStore>)> {
    let embedder: Arc<dyn EmbeddingProvider> =
        Arc::new(GeminiEmbedder::new(settings.gemini_api_key.clone())?);
    let store: Arc<dyn VectorStore> = Arc::new(PineconeVectorStore::new(
        settings.pinecone_api_key.clone(),
        settings.pinecone_index.clone(),
        settings.pinecone_environment.clone(),
    ));
    store.provision(embedder.dimensions()).await?;
    Ok((embedder, store))
}

fn build_responder(
    settings: &Settings,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    config: ResponderConfig,
) -> anyhow::Result<Responder> {
    let model = GeminiChatModel::new(settings.gemini_api_key.clone())?;
    Ok(Responder::builder()
        .config(config)
        .embedding_provider(embedder)
        .vector_store(store)
        .answer_model(Arc::new(model))
        .build()?)
}

async fn chat(
    settings: &Settings,
    top_k: usize,
    system_prompt: Option<String>,
) -> anyhow::Result<()> {
    let (embedder, store) = build_components(settings).await?;
    let responder =
        build_responder(settings, embedder, store, ResponderConfig { top_k, system_prompt })?;

    println!("docent chat. Ask about your corpus; exit, quit, or Ctrl-D to leave.");
    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline("you> ") {
            Ok(line) => {
                let question = line.trim();
                if question.is_empty() {
                    continue;
                }
                if matches!(question, "exit" | "quit") {
                    break;
                }
                let _ = editor.add_history_entry(question);
                match responder.respond(question).await {
                    Ok(response) => print_response(&response),
                    Err(e) => eprintln!("error: {e}"),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }
    println!("goodbye");
    Ok(())
}

fn print_response(response: &ChatResponse) {
    println!("\n{}", response.answer);
    println!(
        "\n[confidence: {} ({:.2})]",
        confidence_label(response.confidence),
        response.confidence
    );
    if !response.sources.is_empty() {
        println!("sources:");
        for (i, source) in response.sources.iter().enumerate() {
            let origin = source
                .metadata
                .get("source_file")
                .or_else(|| source.metadata.get("url"))
                .map_or("manual addition", String::as_str);
            println!("  {}. [{:.3}] {} ({origin})", i + 1, source.score, preview(&source.text));
        }
    }
    println!();
}

async fn ingest(settings: &Settings, path: &Path) -> anyhow::Result<()> {
    let (embedder, store) = build_components(settings).await?;
    let ingestor = Ingestor::new(embedder, store.clone());

    let report = if path.is_dir() {
        ingestor.ingest_csv_dir(path).await?
    } else {
        ingestor.ingest_csv_file(path).await?
    };

    println!(
        "ingested {}: {} upserted, {} skipped, {} failed",
        path.display(),
        report.upserted,
        report.skipped,
        report.failed
    );
    println!("knowledge base now holds {} records", store.count().await?);
    Ok(())
}

async fn scrape(
    settings: &Settings,
    urls: &[String],
    export_csv: Option<&Path>,
    export_html: Option<&Path>,
) -> anyhow::Result<()> {
    let (embedder, store) = build_components(settings).await?;

    let scraper = ArticleScraper::new();
    let articles = scraper.scrape_all(urls).await;
    if articles.is_empty() {
        anyhow::bail!("none of the {} URLs produced an article", urls.len());
    }

    let ingestor = Ingestor::new(embedder, store.clone());
    let mut report = IngestReport::default();
    for article in &articles {
        report.merge(ingestor.ingest_article(article).await?);
    }
    println!(
        "scraped {} of {} articles: {} upserted, {} skipped, {} failed",
        articles.len(),
        urls.len(),
        report.upserted,
        report.skipped,
        report.failed
    );
    println!("knowledge base now holds {} records", store.count().await?);

    if export_csv.is_some() || export_html.is_some() {
        let mut set = ArticleSet::new();
        for article in articles {
            set.push(article);
        }
        if let Some(path) = export_csv {
            set.save_csv(path)?;
            println!("exported articles to {}", path.display());
        }
        if let Some(path) = export_html {
            set.save_html(path)?;
            println!("exported articles to {}", path.display());
        }
    }
    Ok(())
}

async fn add(
    settings: &Settings,
    text: &str,
    metadata: Vec<(String, String)>,
) -> anyhow::Result<()> {
    let (embedder, store) = build_components(settings).await?;
    let responder = build_responder(settings, embedder, store.clone(), ResponderConfig::default())?;

    let metadata: HashMap<String, String> = metadata.into_iter().collect();
    let metadata = if metadata.is_empty() { None } else { Some(metadata) };
    responder.add(text, metadata).await?;

    println!("added passage; knowledge base now holds {} records", store.count().await?);
    Ok(())
}

async fn status(settings: &Settings) -> anyhow::Result<()> {
    let (embedder, store) = build_components(settings).await?;
    println!("index:      {}", settings.pinecone_index);
    println!("backend:    {}", store.backend_name());
    println!("dimensions: {}", embedder.dimensions());
    println!("records:    {}", store.count().await?);
    Ok(())
}

/// Map a raw confidence score to a presentation label.
fn confidence_label(confidence: f32) -> &'static str {
    if confidence >= 0.8 {
        "high"
    } else if confidence >= 0.5 {
        "medium"
    } else {
        "low"
    }
}

/// First 80 characters of a passage, for source listings.
fn preview(text: &str) -> String {
    const MAX_CHARS: usize = 80;
    let mut preview: String = text.chars().take(MAX_CHARS).collect();
    if text.chars().count() > MAX_CHARS {
        preview.push_str("...");
    }
    preview
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) =
        s.split_once('=').ok_or_else(|| format!("invalid key=value pair: {s:?}"))?;
    if key.is_empty() {
        return Err(format!("empty key in pair: {s:?}"));
    }
    Ok((key.to_string(), value.to_string()))
}
