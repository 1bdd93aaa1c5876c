//! Data models for news articles and keyword matches.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Article`]: a news item as returned by the search API
//! - [`ArticleSource`]: the outlet an article was published by
//! - [`NewsResponse`]: the top-level search API response envelope
//! - [`MatchedArticle`]: an article paired with the keywords that fired on it
//!
//! The wire format uses camelCase field names, mapped via serde renames.

use serde::{Deserialize, Serialize};

/// The outlet that published an article.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ArticleSource {
    /// Machine identifier of the outlet (e.g. `"bbc-news"`), when the API knows it.
    #[serde(default)]
    pub id: Option<String>,
    /// Human-readable outlet name (e.g. `"BBC News"`).
    #[serde(default)]
    pub name: Option<String>,
}

/// A news article as returned by the search API.
///
/// Articles are immutable as received. The `url` serves as the unique
/// identifier for deduplication; articles without one cannot be tracked and
/// are skipped by the matcher. All text fields are optional because the API
/// returns `null` for paywalled or truncated records.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// The outlet that published this article.
    #[serde(default)]
    pub source: ArticleSource,
    /// The article headline.
    #[serde(default)]
    pub title: Option<String>,
    /// A short description or excerpt.
    #[serde(default)]
    pub description: Option<String>,
    /// The (possibly truncated) article body.
    #[serde(default)]
    pub content: Option<String>,
    /// Canonical URL; the article's unique identifier.
    #[serde(default)]
    pub url: Option<String>,
    /// Publication timestamp as reported by the API (RFC 3339).
    #[serde(default)]
    pub published_at: Option<String>,
}

impl Article {
    /// Lowercased concatenation of title, description, and content.
    ///
    /// This is the text the matcher scans for keywords. Absent fields
    /// contribute an empty segment so field boundaries stay separated by
    /// whitespace.
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {}",
            self.title.as_deref().unwrap_or(""),
            self.description.as_deref().unwrap_or(""),
            self.content.as_deref().unwrap_or(""),
        )
        .to_lowercase()
    }

    /// The outlet name, or `"Unknown"` when the API did not report one.
    pub fn source_name(&self) -> &str {
        self.source.name.as_deref().unwrap_or("Unknown")
    }
}

/// Top-level response envelope from the news search endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsResponse {
    /// `"ok"` on success; the API also signals errors in the HTTP status.
    pub status: String,
    /// Total number of results matching the query, across all pages.
    #[serde(default)]
    pub total_results: u64,
    /// The articles in this page of results.
    #[serde(default)]
    pub articles: Vec<Article>,
}

/// An article the matcher flagged, with the keywords that fired.
#[derive(Debug, Clone)]
pub struct MatchedArticle {
    /// The article as received from the API.
    pub article: Article,
    /// Every configured keyword found in the article text, lowercased.
    pub matched_keywords: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, description: &str, content: &str) -> Article {
        Article {
            title: Some(title.to_string()),
            description: Some(description.to_string()),
            content: Some(content.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_search_text_lowercases_all_fields() {
        let a = article("Explosion Rocks Downtown", "BREAKING story", "Full Report");
        let text = a.search_text();
        assert!(text.contains("explosion rocks downtown"));
        assert!(text.contains("breaking story"));
        assert!(text.contains("full report"));
    }

    #[test]
    fn test_search_text_tolerates_missing_fields() {
        let a = Article {
            title: Some("Headline".to_string()),
            ..Default::default()
        };
        assert_eq!(a.search_text(), "headline  ");
    }

    #[test]
    fn test_source_name_fallback() {
        let a = Article::default();
        assert_eq!(a.source_name(), "Unknown");

        let b = Article {
            source: ArticleSource {
                id: Some("bbc-news".to_string()),
                name: Some("BBC News".to_string()),
            },
            ..Default::default()
        };
        assert_eq!(b.source_name(), "BBC News");
    }

    #[test]
    fn test_news_response_deserialization() {
        let json = r#"{
            "status": "ok",
            "totalResults": 2,
            "articles": [
                {
                    "source": {"id": "bbc-news", "name": "BBC News"},
                    "title": "Headline one",
                    "description": "Something happened",
                    "content": "Longer text",
                    "url": "https://example.com/one",
                    "publishedAt": "2025-05-06T14:30:00Z"
                },
                {
                    "source": {"id": null, "name": "Reuters"},
                    "title": "Headline two",
                    "description": null,
                    "content": null,
                    "url": "https://example.com/two",
                    "publishedAt": "2025-05-06T15:00:00Z"
                }
            ]
        }"#;

        let resp: NewsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.status, "ok");
        assert_eq!(resp.total_results, 2);
        assert_eq!(resp.articles.len(), 2);
        assert_eq!(
            resp.articles[0].url.as_deref(),
            Some("https://example.com/one")
        );
        assert_eq!(
            resp.articles[0].published_at.as_deref(),
            Some("2025-05-06T14:30:00Z")
        );
        assert!(resp.articles[1].description.is_none());
        assert_eq!(resp.articles[1].source_name(), "Reuters");
    }

    #[test]
    fn test_news_response_empty_articles() {
        let resp: NewsResponse = serde_json::from_str(r#"{"status": "ok"}"#).unwrap();
        assert_eq!(resp.total_results, 0);
        assert!(resp.articles.is_empty());
    }
}
