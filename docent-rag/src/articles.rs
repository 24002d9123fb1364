//! Scraped-article collection with HTML and CSV export.
//!
//! [`ArticleSet`] is an explicit, caller-owned collection: create one, push
//! scraped pages into it, export or ingest them, clear it when done. The
//! export formats are a human-inspection convenience and carry no
//! correctness guarantees beyond a faithful CSV round-trip.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One scraped webpage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    /// The page URL.
    pub url: String,
    /// The page title, empty when the page has none.
    pub title: String,
    /// Whitespace-normalized main-content text.
    pub content: String,
    /// When the page was scraped.
    pub date_scraped: DateTime<Utc>,
}

/// A caller-owned collection of scraped articles.
#[derive(Debug, Default)]
pub struct ArticleSet {
    articles: Vec<Article>,
}

impl ArticleSet {
    /// Create a new empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an article.
    pub fn push(&mut self, article: Article) {
        self.articles.push(article);
    }

    /// Number of collected articles.
    pub fn len(&self) -> usize {
        self.articles.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    /// Drop all collected articles.
    pub fn clear(&mut self) {
        self.articles.clear();
    }

    /// Iterate over the collected articles in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Article> {
        self.articles.iter()
    }

    /// The collected articles as a slice.
    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    /// Write all articles to a simple HTML page.
    pub fn save_html(&self, path: &Path) -> Result<()> {
        let mut html = String::from(
            "<html>\n<head><title>Scraped Articles</title></head>\n<body>\n",
        );
        for article in &self.articles {
            let url = escape_html(&article.url);
            html.push_str(&format!(
                "<article>\n\
                 <h2>{title}</h2>\n\
                 <p><small>Scraped from: <a href=\"{url}\">{url}</a></small></p>\n\
                 <p><small>Date scraped: {date}</small></p>\n\
                 <div class=\"content\">{content}</div>\n\
                 </article>\n\
                 <hr>\n",
                title = escape_html(&article.title),
                date = article.date_scraped.to_rfc3339(),
                content = escape_html(&article.content),
            ));
        }
        html.push_str("</body>\n</html>\n");
        std::fs::write(path, html)?;
        Ok(())
    }

    /// Write all articles to a CSV file with columns
    /// `url,title,content,date_scraped`.
    pub fn save_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for article in &self.articles {
            writer.serialize(article)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Append articles from a CSV file previously written by
    /// [`save_csv`](ArticleSet::save_csv). Returns how many were loaded.
    pub fn load_csv(&mut self, path: &Path) -> Result<usize> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut loaded = 0;
        for article in reader.deserialize::<Article>() {
            self.articles.push(article?);
            loaded += 1;
        }
        Ok(loaded)
    }
}

impl<'a> IntoIterator for &'a ArticleSet {
    type Item = &'a Article;
    type IntoIter = std::slice::Iter<'a, Article>;

    fn into_iter(self) -> Self::IntoIter {
        self.articles.iter()
    }
}

/// Minimal HTML escaping for text and attribute positions.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_article(url: &str) -> Article {
        Article {
            url: url.to_string(),
            title: "A Title".to_string(),
            content: "Body text with <markup> & symbols".to_string(),
            date_scraped: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn push_len_clear_lifecycle() {
        let mut set = ArticleSet::new();
        assert!(set.is_empty());
        set.push(sample_article("https://example.com/a"));
        set.push(sample_article("https://example.com/b"));
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().count(), 2);
        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn csv_round_trip_preserves_articles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.csv");

        let mut set = ArticleSet::new();
        set.push(sample_article("https://example.com/one"));
        set.push(sample_article("https://example.com/two"));
        set.save_csv(&path).unwrap();

        let mut restored = ArticleSet::new();
        let loaded = restored.load_csv(&path).unwrap();
        assert_eq!(loaded, 2);
        assert_eq!(restored.articles(), set.articles());
    }

    #[test]
    fn load_csv_appends_to_existing_articles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.csv");

        let mut set = ArticleSet::new();
        set.push(sample_article("https://example.com/saved"));
        set.save_csv(&path).unwrap();

        let mut target = ArticleSet::new();
        target.push(sample_article("https://example.com/existing"));
        target.load_csv(&path).unwrap();
        assert_eq!(target.len(), 2);
        assert_eq!(target.articles()[0].url, "https://example.com/existing");
        assert_eq!(target.articles()[1].url, "https://example.com/saved");
    }

    #[test]
    fn load_csv_propagates_missing_file() {
        let mut set = ArticleSet::new();
        assert!(set.load_csv(Path::new("/nonexistent/articles.csv")).is_err());
    }

    #[test]
    fn html_export_escapes_and_lists_every_article() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.html");

        let mut set = ArticleSet::new();
        set.push(sample_article("https://example.com/page?a=1&b=2"));
        set.save_html(&path).unwrap();

        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("<h2>A Title</h2>"));
        assert!(html.contains("https://example.com/page?a=1&amp;b=2"));
        assert!(html.contains("Body text with &lt;markup&gt; &amp; symbols"));
        assert!(html.contains("<title>Scraped Articles</title>"));
    }
}
