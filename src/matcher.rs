//! Keyword matching against previously-unseen articles.
//!
//! The matcher scans the lowercased concatenation of each article's title,
//! description, and content for configured keywords. Every examined article
//! is recorded in a [`SeenSet`] keyed by URL, so an article is scored at most
//! once for the life of the process, even when it contains no keyword at the
//! time it is first examined.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use tracing::{debug, info};

use crate::models::{Article, MatchedArticle};

/// Record of article URLs already examined, with first-seen timestamps.
///
/// Entries older than the fetch window are evicted at the start of each
/// cycle; the news query never returns articles that old again, so expired
/// entries can no longer prevent a duplicate alert.
#[derive(Debug, Default)]
pub struct SeenSet {
    entries: HashMap<String, DateTime<Utc>>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    /// Mark a URL as seen now.
    pub fn insert(&mut self, url: &str) {
        self.entries.insert(url.to_string(), Utc::now());
    }

    /// Drop every entry first seen before `cutoff`. Returns how many were
    /// removed.
    pub fn evict_older_than(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, seen_at| *seen_at >= cutoff);
        before - self.entries.len()
    }
}

/// Filter `articles` down to fresh keyword matches.
///
/// Every examined article is marked seen, matched or not. Surviving articles
/// carry the full list of keywords that fired (lowercased, config order,
/// duplicates collapsed). Articles without a URL cannot be deduplicated and
/// are skipped entirely.
pub fn match_articles(
    articles: &[Article],
    keywords: &[String],
    seen: &mut SeenSet,
) -> Vec<MatchedArticle> {
    let keywords: Vec<String> = keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .unique()
        .collect();

    let mut matches = Vec::new();
    for article in articles {
        let Some(url) = article.url.as_deref() else {
            debug!(title = ?article.title, "article has no url; skipping");
            continue;
        };
        if seen.contains(url) {
            continue;
        }
        seen.insert(url);

        let text = article.search_text();
        let matched_keywords: Vec<String> = keywords
            .iter()
            .filter(|k| text.contains(k.as_str()))
            .cloned()
            .collect();

        if !matched_keywords.is_empty() {
            info!(
                title = ?article.title,
                keywords = ?matched_keywords,
                "keyword match in article"
            );
            matches.push(MatchedArticle {
                article: article.clone(),
                matched_keywords,
            });
        }
    }

    matches
}
