//! Webpage fetching and main-content extraction.
//!
//! This module is only available when the `scrape` feature is enabled.
//!
//! Extraction prefers the `<article>` element, then `<main>`, then
//! `<body>`; script, style, and noscript subtrees are dropped and the
//! remaining text is whitespace-normalized into one line of content.

use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::articles::Article;
use crate::error::{DocentError, Result};

/// Fetches webpages and extracts their main content as [`Article`]s.
pub struct ArticleScraper {
    client: reqwest::Client,
}

impl Default for ArticleScraper {
    fn default() -> Self {
        Self::new()
    }
}

impl ArticleScraper {
    /// Create a scraper with a default HTTP client.
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }

    /// Create a scraper using the given HTTP client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch one page and extract its main content.
    ///
    /// # Errors
    ///
    /// Returns [`DocentError::Scrape`] on network failures and non-2xx
    /// responses.
    pub async fn scrape(&self, url: &str) -> Result<Article> {
        debug!(url, "fetching page");
        let scrape_err = |e: reqwest::Error| DocentError::Scrape {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(scrape_err)?;
        let response = response.error_for_status().map_err(scrape_err)?;
        let body = response.text().await.map_err(scrape_err)?;

        let (title, content) = extract_page(&body);
        debug!(url, content_len = content.len(), "extracted page content");

        Ok(Article { url: url.to_string(), title, content, date_scraped: Utc::now() })
    }

    /// Fetch a batch of pages, skipping and logging the ones that fail.
    pub async fn scrape_all(&self, urls: &[String]) -> Vec<Article> {
        let mut articles = Vec::with_capacity(urls.len());
        for url in urls {
            match self.scrape(url).await {
                Ok(article) => articles.push(article),
                Err(e) => warn!(url = %url, error = %e, "skipping page"),
            }
        }
        articles
    }
}

/// Extract `(title, content)` from an HTML document.
///
/// Content comes from the first `<article>` element, else `<main>`, else
/// `<body>`; absent all three the content is empty.
fn extract_page(html: &str) -> (String, String) {
    let doc = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| doc.select(&sel).next())
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let content = ["article", "main", "body"]
        .iter()
        .find_map(|name| {
            let sel = Selector::parse(name).ok()?;
            doc.select(&sel).next()
        })
        .map(|root| {
            let mut parts = Vec::new();
            collect_text(root, &mut parts);
            parts.join(" ")
        })
        .unwrap_or_default();

    (title, normalize_whitespace(&content))
}

/// Collect trimmed text nodes under `el`, excluding script-like subtrees.
fn collect_text(el: ElementRef<'_>, out: &mut Vec<String>) {
    for child in el.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            if matches!(child_el.value().name(), "script" | "style" | "noscript") {
                continue;
            }
            collect_text(child_el, out);
        } else if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push(trimmed.to_string());
            }
        }
    }
}

/// Collapse all runs of whitespace into single spaces.
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
