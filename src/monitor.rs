//! Monitor loop orchestration.
//!
//! One cycle runs fetch → match → notify in sequence and reports a typed
//! [`CycleReport`]. All mutable state lives in an explicit [`MonitorState`]
//! value threaded through each cycle call, so the loop can be exercised
//! deterministically in tests with stub sources and transports. Failures
//! inside a stage are absorbed at the cycle boundary; the loop only stops on
//! Ctrl-C.

use std::time::{Duration, Instant};

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio::time::{self, sleep};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::fetch::{FETCH_WINDOW_HOURS, FetchOutcome, NewsSource, spacing_delay};
use crate::matcher::{SeenSet, match_articles};
use crate::notify::{self, AlertTransport};

/// All mutable state carried across cycles.
///
/// Lives for the process run only; nothing is persisted across restarts.
#[derive(Debug, Default)]
pub struct MonitorState {
    /// Articles already examined, bounded by time-windowed eviction.
    pub seen: SeenSet,
    /// When the last fetch call was issued, for rate-limit spacing.
    pub last_fetch: Option<Instant>,
}

impl MonitorState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// What happened during one fetch–match–notify pass.
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Why the fetch stage failed, when it did. `None` means the query
    /// succeeded, possibly with zero articles, which is not a failure.
    pub fetch_failure: Option<String>,
    /// Articles returned by the fetch stage.
    pub fetched: usize,
    /// Fresh keyword matches found by the matcher.
    pub matched: usize,
    /// Alerts actually delivered by the transport.
    pub alerts_sent: usize,
    /// Seen-set entries evicted at the start of the cycle.
    pub evicted: usize,
}

/// Run one monitoring cycle.
pub async fn run_cycle<S, T>(
    config: &Config,
    source: &S,
    transport: &T,
    state: &mut MonitorState,
) -> CycleReport
where
    S: NewsSource,
    T: AlertTransport,
{
    info!("starting monitoring cycle");
    let mut report = CycleReport::default();

    let cutoff = Utc::now() - chrono::Duration::hours(FETCH_WINDOW_HOURS);
    report.evicted = state.seen.evict_older_than(cutoff);
    if report.evicted > 0 {
        info!(evicted = report.evicted, "dropped expired seen entries");
    }

    if let Some(delay) = spacing_delay(state.last_fetch, Instant::now()) {
        warn!(?delay, "spacing fetch calls to stay within the API budget");
        sleep(delay).await;
    }
    state.last_fetch = Some(Instant::now());

    let articles = match source.fetch().await {
        FetchOutcome::Fetched(articles) => articles,
        FetchOutcome::Failed(reason) => {
            error!(%reason, "fetch failed; treating cycle as empty");
            report.fetch_failure = Some(reason);
            info!(matched = 0, alerts_sent = 0, "monitoring cycle complete");
            return report;
        }
    };
    report.fetched = articles.len();

    let matches = match_articles(&articles, &config.alert_keywords, &mut state.seen);
    report.matched = matches.len();

    report.alerts_sent = stream::iter(matches.iter())
        .then(|m| notify::send_alert(transport, m))
        .filter(|sent| std::future::ready(*sent))
        .count()
        .await;

    info!(
        fetched = report.fetched,
        matched = report.matched,
        alerts_sent = report.alerts_sent,
        "monitoring cycle complete"
    );
    report
}

/// Run cycles until Ctrl-C, sleeping the configured interval between them.
///
/// The first cycle runs immediately. A cycle that fails is logged and the
/// loop proceeds to the next tick.
pub async fn run_continuous<S, T>(config: &Config, source: &S, transport: &T)
where
    S: NewsSource,
    T: AlertTransport,
{
    let mut state = MonitorState::new();
    info!(
        interval_secs = config.check_interval_secs,
        "starting continuous monitoring"
    );

    let mut interval = time::interval(Duration::from_secs(config.check_interval_secs.max(1)));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let report = run_cycle(config, source, transport, &mut state).await;
                if let Some(reason) = &report.fetch_failure {
                    warn!(%reason, "cycle ended without data");
                }
                info!(
                    sleep_secs = config.check_interval_secs,
                    "sleeping until next cycle"
                );
            }
            _ = &mut shutdown => {
                info!("monitoring stopped by user");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, WatchError};
    use crate::models::Article;
    use std::sync::Mutex;

    fn test_config(keywords: &[&str]) -> Config {
        Config {
            news_api_key: "key".to_string(),
            twilio_account_sid: "sid".to_string(),
            twilio_auth_token: "token".to_string(),
            twilio_whatsapp_number: "whatsapp:+14155238886".to_string(),
            personal_whatsapp_number: "whatsapp:+491234567".to_string(),
            alert_keywords: keywords.iter().map(|s| s.to_string()).collect(),
            check_interval_secs: 900,
            news_sources: "bbc-news".to_string(),
        }
    }

    fn article(url: &str, title: &str) -> Article {
        Article {
            url: Some(url.to_string()),
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    /// Source that returns the same articles on every fetch.
    struct StubSource {
        articles: Vec<Article>,
    }

    impl NewsSource for StubSource {
        async fn fetch(&self) -> FetchOutcome {
            FetchOutcome::Fetched(self.articles.clone())
        }
    }

    /// Source that fails every fetch, as on a non-success API status.
    struct FailingSource;

    impl NewsSource for FailingSource {
        async fn fetch(&self) -> FetchOutcome {
            FetchOutcome::Failed("status 429 Too Many Requests".to_string())
        }
    }

    /// Transport recording every body it is asked to send.
    struct RecordingTransport {
        sent: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingTransport {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: true,
            }
        }
    }

    impl AlertTransport for RecordingTransport {
        async fn send(&self, body: &str) -> Result<String> {
            if self.fail {
                return Err(WatchError::Provider {
                    status: 500,
                    body: "server error".to_string(),
                });
            }
            self.sent.lock().unwrap().push(body.to_string());
            Ok("SM123".to_string())
        }
    }

    #[tokio::test]
    async fn test_cycle_sends_alert_per_fresh_match() {
        let config = test_config(&["explosion"]);
        let source = StubSource {
            articles: vec![
                article("u1", "Explosion rocks downtown"),
                article("u2", "Calm day everywhere"),
            ],
        };
        let transport = RecordingTransport::new();
        let mut state = MonitorState::new();

        let report = run_cycle(&config, &source, &transport, &mut state).await;
        assert!(report.fetch_failure.is_none());
        assert_eq!(report.fetched, 2);
        assert_eq!(report.matched, 1);
        assert_eq!(report.alerts_sent, 1);

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("Explosion rocks downtown"));
        assert!(sent[0].contains("Keywords: explosion"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_cycles_do_not_realert() {
        let config = test_config(&["explosion"]);
        let source = StubSource {
            articles: vec![article("u1", "Explosion rocks downtown")],
        };
        let transport = RecordingTransport::new();
        let mut state = MonitorState::new();

        let first = run_cycle(&config, &source, &transport, &mut state).await;
        assert_eq!(first.alerts_sent, 1);

        // Same article comes back from the API; no duplicate alert.
        let second = run_cycle(&config, &source, &transport, &mut state).await;
        assert_eq!(second.matched, 0);
        assert_eq!(second.alerts_sent, 0);
        assert_eq!(transport.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_completes_cycle_with_zero_matches() {
        let config = test_config(&["explosion"]);
        let transport = RecordingTransport::new();
        let mut state = MonitorState::new();

        let report = run_cycle(&config, &FailingSource, &transport, &mut state).await;
        assert_eq!(
            report.fetch_failure.as_deref(),
            Some("status 429 Too Many Requests")
        );
        assert_eq!(report.matched, 0);
        assert_eq!(report.alerts_sent, 0);
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_transport_still_reports_matches() {
        let config = test_config(&["explosion"]);
        let source = StubSource {
            articles: vec![article("u1", "Explosion rocks downtown")],
        };
        let transport = RecordingTransport::failing();
        let mut state = MonitorState::new();

        let report = run_cycle(&config, &source, &transport, &mut state).await;
        assert_eq!(report.matched, 1);
        assert_eq!(report.alerts_sent, 0);
    }

    #[tokio::test]
    async fn test_cycle_records_last_fetch_time() {
        let config = test_config(&["explosion"]);
        let source = StubSource { articles: vec![] };
        let transport = RecordingTransport::new();
        let mut state = MonitorState::new();
        assert!(state.last_fetch.is_none());

        run_cycle(&config, &source, &transport, &mut state).await;
        assert!(state.last_fetch.is_some());
    }

    #[tokio::test]
    async fn test_empty_keyword_list_yields_no_alerts() {
        let config = test_config(&[]);
        let source = StubSource {
            articles: vec![article("u1", "Explosion rocks downtown")],
        };
        let transport = RecordingTransport::new();
        let mut state = MonitorState::new();

        let report = run_cycle(&config, &source, &transport, &mut state).await;
        assert_eq!(report.fetched, 1);
        assert_eq!(report.matched, 0);
        assert!(state.seen.contains("u1"));
    }
}
