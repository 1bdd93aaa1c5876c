//! Runtime configuration loading and validation.
//!
//! Configuration is assembled once at startup, either from environment
//! variables or from a JSON file passed on the command line (the file
//! replaces the environment-derived values entirely). After assembly the
//! config is validated for required keys and the messaging addresses are
//! normalized, then treated as immutable for the life of the process.

use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::error::{Result, WatchError};

/// Default sender address: the Twilio WhatsApp sandbox number.
const DEFAULT_SENDER: &str = "whatsapp:+14155238886";
/// Default keyword list used when none is configured.
const DEFAULT_KEYWORDS: &str = "attack,explosion,terrorism,military operation,threat,security breach";
/// Default polling interval between monitoring cycles.
const DEFAULT_INTERVAL_SECS: u64 = 900;
/// Default comma-separated allow-list of news sources.
const DEFAULT_SOURCES: &str = "bbc-news,cnn,reuters,associated-press";

/// Immutable runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the news search endpoint.
    pub news_api_key: String,
    /// Twilio account SID.
    pub twilio_account_sid: String,
    /// Twilio auth token.
    pub twilio_auth_token: String,
    /// Sender WhatsApp address (`whatsapp:+<digits>`).
    pub twilio_whatsapp_number: String,
    /// Recipient WhatsApp address (`whatsapp:+<digits>`).
    pub personal_whatsapp_number: String,
    /// Keywords that trigger an alert when found in article text.
    pub alert_keywords: Vec<String>,
    /// Seconds to sleep between monitoring cycles.
    pub check_interval_secs: u64,
    /// Comma-separated source allow-list, passed through to the news API.
    pub news_sources: String,
}

/// Shape of the optional JSON configuration file.
///
/// Every field is optional; absent required fields are caught by
/// [`Config::load`] during validation, and absent optional fields fall back
/// to the same defaults the environment path uses.
#[derive(Debug, Deserialize)]
struct FileConfig {
    news_api_key: Option<String>,
    twilio_account_sid: Option<String>,
    twilio_auth_token: Option<String>,
    twilio_whatsapp_number: Option<String>,
    personal_whatsapp_number: Option<String>,
    alert_keywords: Option<Vec<String>>,
    check_interval: Option<u64>,
    news_sources: Option<String>,
}

impl Config {
    /// Load, validate, and normalize configuration.
    ///
    /// When `config_path` is given the JSON file replaces the
    /// environment-derived configuration. Validation failures are fatal and
    /// should abort the process with a non-zero exit.
    pub fn load(config_path: Option<&Path>) -> Result<Config> {
        let mut config = match config_path {
            Some(path) => Config::from_file(path)?,
            None => Config::from_env()?,
        };
        config.validate()?;
        config.normalize_addresses();
        Ok(config)
    }

    /// Assemble configuration from environment variables.
    fn from_env() -> Result<Config> {
        let interval = match std::env::var("CHECK_INTERVAL") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| {
                WatchError::Config(format!("CHECK_INTERVAL is not a number: {raw}"))
            })?,
            Err(_) => DEFAULT_INTERVAL_SECS,
        };

        Ok(Config {
            news_api_key: env_or_empty("NEWS_API_KEY"),
            twilio_account_sid: env_or_empty("TWILIO_ACCOUNT_SID"),
            twilio_auth_token: env_or_empty("TWILIO_AUTH_TOKEN"),
            twilio_whatsapp_number: std::env::var("TWILIO_WHATSAPP_NUMBER")
                .unwrap_or_else(|_| DEFAULT_SENDER.to_string()),
            personal_whatsapp_number: env_or_empty("PERSONAL_WHATSAPP_NUMBER"),
            alert_keywords: parse_list(
                &std::env::var("ALERT_KEYWORDS").unwrap_or_else(|_| DEFAULT_KEYWORDS.to_string()),
            ),
            check_interval_secs: interval,
            news_sources: std::env::var("NEWS_SOURCES")
                .unwrap_or_else(|_| DEFAULT_SOURCES.to_string()),
        })
    }

    /// Assemble configuration from a JSON file.
    fn from_file(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path).map_err(|source| WatchError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let file: FileConfig = serde_json::from_str(&content)?;

        Ok(Config {
            news_api_key: file.news_api_key.unwrap_or_default(),
            twilio_account_sid: file.twilio_account_sid.unwrap_or_default(),
            twilio_auth_token: file.twilio_auth_token.unwrap_or_default(),
            twilio_whatsapp_number: file
                .twilio_whatsapp_number
                .unwrap_or_else(|| DEFAULT_SENDER.to_string()),
            personal_whatsapp_number: file.personal_whatsapp_number.unwrap_or_default(),
            alert_keywords: file
                .alert_keywords
                .map(|ks| ks.iter().map(|k| k.trim().to_string()).collect())
                .unwrap_or_else(|| parse_list(DEFAULT_KEYWORDS)),
            check_interval_secs: file.check_interval.unwrap_or(DEFAULT_INTERVAL_SECS),
            news_sources: file.news_sources.unwrap_or_else(|| DEFAULT_SOURCES.to_string()),
        })
    }

    /// Check that every required key carries a value.
    fn validate(&self) -> Result<()> {
        let required = [
            ("news_api_key", &self.news_api_key),
            ("twilio_account_sid", &self.twilio_account_sid),
            ("twilio_auth_token", &self.twilio_auth_token),
            ("personal_whatsapp_number", &self.personal_whatsapp_number),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(key, _)| *key)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(WatchError::Config(format!(
                "Missing required configuration keys: {}",
                missing.join(", ")
            )))
        }
    }

    /// Rewrite both messaging addresses into `whatsapp:+<digits>` form.
    fn normalize_addresses(&mut self) {
        for (key, addr) in [
            ("twilio_whatsapp_number", &mut self.twilio_whatsapp_number),
            ("personal_whatsapp_number", &mut self.personal_whatsapp_number),
        ] {
            if !addr.starts_with("whatsapp:+") {
                warn!(key, "address should start with 'whatsapp:+'; fixing format");
                *addr = normalize_address(addr);
            }
        }
    }
}

/// Read an environment variable, treating absence as an empty value.
///
/// Validation reports empty required values, so absence and explicit empty
/// strings fail the same way.
fn env_or_empty(key: &str) -> String {
    std::env::var(key).unwrap_or_default()
}

/// Split a comma-separated list, trimming entries and dropping empties.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Force an address into `whatsapp:+<digits>` form.
fn normalize_address(addr: &str) -> String {
    let digits = addr
        .trim()
        .trim_start_matches("whatsapp:")
        .trim_start_matches('+');
    format!("whatsapp:+{digits}")
}
