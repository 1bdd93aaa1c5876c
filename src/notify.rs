//! WhatsApp alert delivery via the Twilio messages API.
//!
//! Each matched article is rendered into a fixed-template text message and
//! submitted from the configured sender to the configured recipient.
//! Provider errors are caught and logged at this layer; a failed send never
//! aborts the monitoring cycle. A parallel test-message path exists for
//! manual verification of the transport.

use chrono::{DateTime, Local};
use serde::Deserialize;
use tracing::{error, info, instrument};
use url::Url;

use crate::config::Config;
use crate::error::{Result, WatchError};
use crate::models::MatchedArticle;

/// Base URL of the Twilio REST API.
const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01/";

/// Trait seam for alert delivery.
pub trait AlertTransport {
    /// Submit one message body, returning the provider's message SID.
    async fn send(&self, body: &str) -> Result<String>;
}

/// Successful message-creation response from the provider.
#[derive(Debug, Deserialize)]
struct MessageCreated {
    sid: String,
}

/// Production transport over the Twilio messages endpoint.
pub struct TwilioClient {
    http: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from: String,
    to: String,
    endpoint: Url,
}

impl TwilioClient {
    pub fn new(config: &Config) -> Self {
        let endpoint = Url::parse(TWILIO_API_BASE)
            .and_then(|base| {
                base.join(&format!(
                    "Accounts/{}/Messages.json",
                    config.twilio_account_sid
                ))
            })
            .expect("twilio endpoint url");

        Self {
            http: reqwest::Client::new(),
            account_sid: config.twilio_account_sid.clone(),
            auth_token: config.twilio_auth_token.clone(),
            from: config.twilio_whatsapp_number.clone(),
            to: config.personal_whatsapp_number.clone(),
            endpoint,
        }
    }
}

impl AlertTransport for TwilioClient {
    #[instrument(level = "info", skip_all)]
    async fn send(&self, body: &str) -> Result<String> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("From", self.from.as_str()),
                ("To", self.to.as_str()),
                ("Body", body),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WatchError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let created: MessageCreated = response.json().await?;
        Ok(created.sid)
    }
}

/// Render the alert template for one matched article.
pub fn render_alert(matched: &MatchedArticle) -> String {
    let article = &matched.article;
    format!(
        "🚨 *NEWSWATCH ALERT* 🚨\n\n\
         *{title}*\n\n\
         {description}\n\n\
         Source: {source}\n\
         Published: {published}\n\
         Keywords: {keywords}\n\n\
         Read more: {url}",
        title = article.title.as_deref().unwrap_or("Breaking News"),
        description = article
            .description
            .as_deref()
            .unwrap_or("Keyword match in recent news coverage."),
        source = article.source_name(),
        published = article.published_at.as_deref().unwrap_or("Unknown"),
        keywords = matched.matched_keywords.join(", "),
        url = article.url.as_deref().unwrap_or(""),
    )
}

/// Render the test-message template.
pub fn render_test_message(now: DateTime<Local>) -> String {
    format!(
        "🔍 *NEWSWATCH TEST MESSAGE* 🔍\n\n\
         This is a test alert from newswatch.\n\
         The monitor is operational and ready to watch for keywords.\n\n\
         Time: {}",
        now.format("%Y-%m-%d %H:%M:%S")
    )
}

/// Send an alert for one matched article.
///
/// Returns whether the send succeeded; provider errors are logged here and
/// never propagated.
pub async fn send_alert<T: AlertTransport>(transport: &T, matched: &MatchedArticle) -> bool {
    let body = render_alert(matched);
    match transport.send(&body).await {
        Ok(sid) => {
            info!(%sid, title = ?matched.article.title, "alert sent");
            true
        }
        Err(e) => {
            error!(error = %e, title = ?matched.article.title, "failed to send alert");
            false
        }
    }
}

/// Send a test message over the configured transport.
pub async fn send_test<T: AlertTransport>(transport: &T) -> bool {
    let body = render_test_message(Local::now());
    match transport.send(&body).await {
        Ok(sid) => {
            info!(%sid, "test message sent");
            true
        }
        Err(e) => {
            error!(error = %e, "failed to send test message");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Article, ArticleSource};
    use chrono::TimeZone;

    fn matched() -> MatchedArticle {
        MatchedArticle {
            article: Article {
                source: ArticleSource {
                    id: Some("bbc-news".to_string()),
                    name: Some("BBC News".to_string()),
                },
                title: Some("Explosion rocks downtown".to_string()),
                description: Some("Authorities are responding.".to_string()),
                content: Some("Longer body text".to_string()),
                url: Some("https://example.com/story".to_string()),
                published_at: Some("2025-05-06T14:30:00Z".to_string()),
            },
            matched_keywords: vec!["explosion".to_string(), "attack".to_string()],
        }
    }

    #[test]
    fn test_render_alert_includes_all_fields() {
        let body = render_alert(&matched());
        assert!(body.contains("*Explosion rocks downtown*"));
        assert!(body.contains("Authorities are responding."));
        assert!(body.contains("Source: BBC News"));
        assert!(body.contains("Published: 2025-05-06T14:30:00Z"));
        assert!(body.contains("Keywords: explosion, attack"));
        assert!(body.contains("Read more: https://example.com/story"));
    }

    #[test]
    fn test_render_alert_fallbacks_for_missing_fields() {
        let m = MatchedArticle {
            article: Article::default(),
            matched_keywords: vec!["explosion".to_string()],
        };
        let body = render_alert(&m);
        assert!(body.contains("*Breaking News*"));
        assert!(body.contains("Keyword match in recent news coverage."));
        assert!(body.contains("Source: Unknown"));
        assert!(body.contains("Published: Unknown"));
    }

    #[test]
    fn test_render_test_message_carries_timestamp() {
        let now = Local.with_ymd_and_hms(2025, 5, 6, 14, 30, 0).unwrap();
        let body = render_test_message(now);
        assert!(body.contains("TEST MESSAGE"));
        assert!(body.contains("2025-05-06 14:30:00"));
    }

    struct FailingTransport;

    impl AlertTransport for FailingTransport {
        async fn send(&self, _body: &str) -> Result<String> {
            Err(WatchError::Provider {
                status: 401,
                body: "authentication failed".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_send_alert_reports_failure_without_propagating() {
        assert!(!send_alert(&FailingTransport, &matched()).await);
    }

    #[tokio::test]
    async fn test_send_test_reports_failure_without_propagating() {
        assert!(!send_test(&FailingTransport).await);
    }
}
