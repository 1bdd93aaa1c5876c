//! Command-line interface definitions for newswatch.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! With no mode flag the monitor runs continuously until interrupted.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the newswatch monitor.
///
/// # Examples
///
/// ```sh
/// # Send a test WhatsApp message and exit
/// newswatch --test
///
/// # Run exactly one monitoring cycle
/// newswatch --once
///
/// # Run continuously with configuration from a file
/// newswatch --config ./newswatch.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Send a test message over the configured transport and exit
    #[arg(long)]
    pub test: bool,

    /// Run a single monitoring cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Optional path to a JSON configuration file (replaces environment
    /// configuration)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
