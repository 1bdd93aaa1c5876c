//! Time-windowed, keyword-filtered news fetching.
//!
//! The fetch stage issues one query per monitoring cycle against a news
//! search endpoint and reports a typed [`FetchOutcome`] so the caller can
//! tell "no articles" apart from "fetch failed". Transport errors and
//! non-success statuses never abort a cycle.
//!
//! # Architecture
//!
//! - [`NewsSource`]: trait seam for the fetch stage, so the monitor loop can
//!   be exercised against stub sources in tests
//! - [`NewsApiClient`]: production implementation over the NewsAPI
//!   `everything` endpoint
//!
//! # Rate Limiting
//!
//! The free API tier budgets requests per day, so consecutive fetches are
//! kept at least [`MIN_FETCH_SPACING`] apart. [`spacing_delay`] computes the
//! required wait from the caller's last-fetch timestamp; the monitor loop
//! sleeps it before calling [`NewsSource::fetch`].

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use itertools::Itertools;
use tracing::{error, info, instrument};

use crate::config::Config;
use crate::models::{Article, NewsResponse};

/// News search endpoint.
const NEWS_API_URL: &str = "https://newsapi.org/v2/everything";

/// Articles older than this many hours are outside the fetch window.
pub const FETCH_WINDOW_HOURS: i64 = 6;

/// Minimum spacing between consecutive fetch calls.
pub const MIN_FETCH_SPACING: Duration = Duration::from_secs(60);

/// Qualifiers appended to the keyword query to bias results toward
/// urgent coverage.
const URGENCY_QUALIFIERS: &str = "breaking OR emergency OR urgent OR alert";

/// Result of one fetch attempt.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The query succeeded; the window may legitimately contain no articles.
    Fetched(Vec<Article>),
    /// The query failed at the transport or API layer, with a reason.
    Failed(String),
}

impl FetchOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed(_))
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            FetchOutcome::Fetched(_) => None,
            FetchOutcome::Failed(reason) => Some(reason),
        }
    }
}

/// Trait seam for the fetch stage.
pub trait NewsSource {
    /// Fetch articles published within the current window.
    async fn fetch(&self) -> FetchOutcome;
}

/// How long to wait before the next fetch is allowed, if at all.
pub fn spacing_delay(last_fetch: Option<Instant>, now: Instant) -> Option<Duration> {
    let elapsed = now.duration_since(last_fetch?);
    (elapsed < MIN_FETCH_SPACING).then(|| MIN_FETCH_SPACING - elapsed)
}

/// Boolean-OR keyword query with urgency qualifiers.
pub fn build_query(keywords: &[String]) -> String {
    let terms = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .join(" OR ");
    format!("({terms}) AND ({URGENCY_QUALIFIERS})")
}

/// Start of the fetch window, formatted the way the API expects.
pub fn window_start(now: DateTime<Utc>) -> String {
    (now - chrono::Duration::hours(FETCH_WINDOW_HOURS))
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string()
}

/// Production news source backed by the NewsAPI `everything` endpoint.
pub struct NewsApiClient {
    http: reqwest::Client,
    api_key: String,
    keywords: Vec<String>,
    sources: String,
    endpoint: String,
}

impl NewsApiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.news_api_key.clone(),
            keywords: config.alert_keywords.clone(),
            sources: config.news_sources.clone(),
            endpoint: NEWS_API_URL.to_string(),
        }
    }
}

impl NewsSource for NewsApiClient {
    #[instrument(level = "info", skip_all)]
    async fn fetch(&self) -> FetchOutcome {
        let query = build_query(&self.keywords);
        let from = window_start(Utc::now());
        info!(%query, %from, "fetching news");

        let result = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("q", query.as_str()),
                ("sources", self.sources.as_str()),
                ("from", from.as_str()),
                ("sortBy", "publishedAt"),
                ("language", "en"),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "news fetch failed at transport layer");
                return FetchOutcome::Failed(format!("transport error: {e}"));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %preview(&body), "news API returned an error");
            return FetchOutcome::Failed(format!("status {status}"));
        }

        match response.json::<NewsResponse>().await {
            Ok(body) => {
                info!(
                    count = body.articles.len(),
                    total_results = body.total_results,
                    "fetched articles"
                );
                FetchOutcome::Fetched(body.articles)
            }
            Err(e) => {
                error!(error = %e, "news API response did not parse");
                FetchOutcome::Failed(format!("malformed response: {e}"))
            }
        }
    }
}

/// Cap a response body for log lines.
fn preview(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}
