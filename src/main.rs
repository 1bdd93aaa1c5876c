//! # newswatch
//!
//! A monitoring loop that polls a news search API for keyword matches in
//! recent coverage and forwards alerts over WhatsApp via the Twilio
//! messages API.
//!
//! ## Usage
//!
//! ```sh
//! # Continuous monitoring (default)
//! newswatch
//!
//! # Verify the messaging transport, then exit
//! newswatch --test
//!
//! # Run one cycle, then exit
//! newswatch --once
//! ```
//!
//! ## Architecture
//!
//! Each cycle runs three sequential stages:
//! 1. **Fetch**: time-windowed, keyword-filtered query against the news API
//! 2. **Match**: flag previously-unseen articles containing any configured
//!    keyword
//! 3. **Notify**: render and send one WhatsApp alert per fresh match
//!
//! Configuration comes from environment variables or an optional JSON file;
//! validation failures exit non-zero before any network call is made.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod fetch;
mod matcher;
mod models;
mod monitor;
mod notify;

use cli::Cli;
use config::Config;
use fetch::NewsApiClient;
use monitor::MonitorState;
use notify::TwilioClient;

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    info!(?args.test, ?args.once, "newswatch starting up");

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "configuration error");
            return ExitCode::FAILURE;
        }
    };
    info!(
        keywords = config.alert_keywords.len(),
        interval_secs = config.check_interval_secs,
        sources = %config.news_sources,
        "configuration loaded"
    );

    let transport = TwilioClient::new(&config);

    if args.test {
        info!("running in test mode; sending test message");
        return if notify::send_test(&transport).await {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    let source = NewsApiClient::new(&config);

    if args.once {
        info!("running a single monitoring cycle");
        let mut state = MonitorState::new();
        monitor::run_cycle(&config, &source, &transport, &mut state).await;
        return ExitCode::SUCCESS;
    }

    monitor::run_continuous(&config, &source, &transport).await;
    ExitCode::SUCCESS
}
