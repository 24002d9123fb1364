//! Ingestion pipeline for tabular files and scraped pages.
//!
//! The [`Ingestor`] normalizes each source unit into a `(text, metadata)`
//! pair, derives a deterministic record id, embeds the text, and upserts
//! into the vector store. Failures are contained per unit of work: a bad
//! row, page, or file is logged and counted, never allowed to abort the
//! rest of the batch.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::articles::Article;
use crate::document::{DocumentRecord, record_id};
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::vectorstore::VectorStore;

/// Per-batch ingestion outcome counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Records embedded and upserted.
    pub upserted: usize,
    /// Units skipped because they had no content.
    pub skipped: usize,
    /// Units that failed to parse, embed, or upsert.
    pub failed: usize,
}

impl IngestReport {
    /// Fold another report's counters into this one.
    pub fn merge(&mut self, other: IngestReport) {
        self.upserted += other.upserted;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// The ingestion pipeline: normalize, identify, embed, upsert.
pub struct Ingestor {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl Ingestor {
    /// Create an ingestor over the given embedding provider and store.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Ingest one CSV file. The first row is read as headers.
    ///
    /// Each data row becomes one record: its text is the row's non-empty
    /// cells joined by a single space in column order, its id is derived
    /// from `(file_name, row_index)`, and its metadata carries the source
    /// file name, the row index, an ingestion timestamp, and every original
    /// column value. Rows with no content are skipped and counted; rows
    /// that fail to parse, embed, or upsert are logged and counted without
    /// aborting the file.
    ///
    /// # Errors
    ///
    /// Returns [`DocentError::Csv`](crate::DocentError::Csv) if the file
    /// itself cannot be opened or its header row cannot be read.
    pub async fn ingest_csv_file(&self, path: &Path) -> Result<IngestReport> {
        let file_name =
            path.file_name().and_then(|n| n.to_str()).unwrap_or("unnamed.csv").to_string();
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.clone();

        let mut report = IngestReport::default();
        for (row_index, row) in reader.records().enumerate() {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    warn!(file = %file_name, row_index, error = %e, "skipping malformed row");
                    report.failed += 1;
                    continue;
                }
            };

            let text = row
                .iter()
                .map(str::trim)
                .filter(|cell| !cell.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            if text.is_empty() {
                debug!(file = %file_name, row_index, "skipping row with no content");
                report.skipped += 1;
                continue;
            }

            let mut metadata: HashMap<String, String> = headers
                .iter()
                .zip(row.iter())
                .map(|(header, cell)| (header.to_string(), cell.to_string()))
                .collect();
            metadata.insert("source_file".to_string(), file_name.clone());
            metadata.insert("row_index".to_string(), row_index.to_string());
            metadata.insert("ingested_at".to_string(), Utc::now().to_rfc3339());

            let seed = format!("{file_name}:{row_index}");
            match self.upsert_unit(&seed, text, metadata).await {
                Ok(()) => report.upserted += 1,
                Err(e) => {
                    warn!(file = %file_name, row_index, error = %e, "failed to ingest row");
                    report.failed += 1;
                }
            }
        }

        info!(
            file = %file_name,
            upserted = report.upserted,
            skipped = report.skipped,
            failed = report.failed,
            "ingested tabular file"
        );
        Ok(report)
    }

    /// Ingest every `*.csv` file in a directory, in sorted name order.
    ///
    /// Files are processed independently: one file's fatal parse error is
    /// logged and counted as a failure, and processing continues with the
    /// next file.
    ///
    /// # Errors
    ///
    /// Returns [`DocentError::Io`](crate::DocentError::Io) if the directory
    /// itself cannot be enumerated.
    pub async fn ingest_csv_dir(&self, dir: &Path) -> Result<IngestReport> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
            })
            .collect();
        paths.sort();

        let mut total = IngestReport::default();
        for path in &paths {
            match self.ingest_csv_file(path).await {
                Ok(report) => total.merge(report),
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "failed to ingest file, continuing");
                    total.failed += 1;
                }
            }
        }

        info!(
            dir = %dir.display(),
            files = paths.len(),
            upserted = total.upserted,
            skipped = total.skipped,
            failed = total.failed,
            "directory ingestion complete"
        );
        Ok(total)
    }

    /// Ingest one scraped article.
    ///
    /// The article's content becomes the passage text; its URL seeds the
    /// record id, so re-scraping a page supersedes the stored record.
    /// An article with no content is a counted skip, not an error.
    pub async fn ingest_article(&self, article: &Article) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        let text = article.content.trim();
        if text.is_empty() {
            debug!(url = %article.url, "skipping article with no content");
            report.skipped += 1;
            return Ok(report);
        }

        let mut metadata = HashMap::new();
        metadata.insert("url".to_string(), article.url.clone());
        metadata.insert("title".to_string(), article.title.clone());
        metadata.insert("date_scraped".to_string(), article.date_scraped.to_rfc3339());
        metadata.insert("ingested_at".to_string(), Utc::now().to_rfc3339());

        match self.upsert_unit(&article.url, text.to_string(), metadata).await {
            Ok(()) => {
                report.upserted += 1;
                info!(url = %article.url, "ingested article");
            }
            Err(e) => {
                warn!(url = %article.url, error = %e, "failed to ingest article");
                report.failed += 1;
            }
        }
        Ok(report)
    }

    /// Embed one normalized unit and upsert it as a record.
    async fn upsert_unit(
        &self,
        id_seed: &str,
        text: String,
        metadata: HashMap<String, String>,
    ) -> Result<()> {
        let embedding = self.embedder.embed(&text).await?;
        let record = DocumentRecord { id: record_id(id_seed), text, metadata, embedding };
        self.store.upsert(std::slice::from_ref(&record)).await
    }
}
