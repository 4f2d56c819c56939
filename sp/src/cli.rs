//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// sp - progress notifications for live puzzle sessions
#[derive(Parser)]
#[command(
    name = "sp",
    about = "Report puzzle-session progress to a notification endpoint or embedding context",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show how launch parameters would be interpreted
    Params {
        /// Launch URL or query string (session=...&notify=...)
        launch: String,
    },

    /// Drive a tracker from a JSON-lines event stream
    Replay {
        /// Launch URL or query string (session=...&notify=...)
        launch: String,

        /// Event file; reads stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Unix socket of an opener context (message mode)
        #[arg(long, value_name = "PATH")]
        opener_socket: Option<PathBuf>,

        /// Pause between events in milliseconds
        #[arg(long, default_value = "0")]
        delay_ms: u64,

        /// Keep the tracker alive this long after the last event
        #[arg(long, default_value = "500")]
        linger_ms: u64,
    },
}
