//! sp - progress notifications for live puzzle sessions
//!
//! CLI entry point for inspecting launch parameters and replaying sessions.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use eyre::{Context, Result};
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{debug, info, warn};

use sudoku_progress::cli::{Cli, Command};
use sudoku_progress::config::Config;
use sudoku_progress::replay::replay;
use sudoku_progress::{EmbeddingContexts, TrackerConfig, TransportMode, WriterContext, create_progress_tracker};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    // stdout carries message-mode envelopes, so logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to install subscriber: {}", e))?;

    debug!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Params { launch } => cmd_params(&launch),
        Command::Replay {
            launch,
            input,
            opener_socket,
            delay_ms,
            linger_ms,
        } => {
            cmd_replay(
                &config,
                &launch,
                input,
                opener_socket,
                Duration::from_millis(delay_ms),
                Duration::from_millis(linger_ms),
            )
            .await
        }
    }
}

/// Print the parsed launch parameters
fn cmd_params(launch: &str) -> Result<()> {
    debug!(%launch, "cmd_params: called");
    let Some(params) = TrackerConfig::from_launch_input(launch) else {
        println!("Tracking disabled: no session id");
        return Ok(());
    };

    println!("Session:   {}", params.session_id);
    println!(
        "Notify:    {}",
        params.notification_target.as_ref().map(|u| u.as_str()).unwrap_or("(none)")
    );
    if params.heartbeat_enabled() {
        println!("Interval:  {} ms", params.update_interval_ms);
    } else {
        println!("Interval:  disabled");
    }
    println!("Transport: {}", params.transport_mode);
    Ok(())
}

/// Drive a tracker from recorded events
async fn cmd_replay(
    config: &Config,
    launch: &str,
    input: Option<PathBuf>,
    opener_socket: Option<PathBuf>,
    delay: Duration,
    linger: Duration,
) -> Result<()> {
    debug!(%launch, ?input, ?opener_socket, ?delay, ?linger, "cmd_replay: called");
    let Some(params) = TrackerConfig::from_launch_input(launch) else {
        info!("No session id in launch parameters, nothing to track");
        return Ok(());
    };

    let contexts = embedding_contexts(config, params.transport_mode, opener_socket);
    let Some(tracker) = create_progress_tracker(params, contexts, config) else {
        info!("Tracking disabled");
        return Ok(());
    };

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .context(format!("Failed to open {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let summary = replay(&tracker, reader, delay).await?;
    info!(
        applied = summary.applied,
        skipped = summary.skipped,
        sent = tracker.sent_count(),
        "Replay finished"
    );

    // In-flight deliveries run on their own tasks; give them time to land
    tokio::time::sleep(linger).await;
    tracker.destroy();
    Ok(())
}

/// Parent is our stdout; the opener is reached over a Unix socket
fn embedding_contexts(config: &Config, mode: TransportMode, opener_socket: Option<PathBuf>) -> EmbeddingContexts {
    if mode != TransportMode::Message {
        if opener_socket.is_some() {
            warn!("--opener-socket only applies to message transport, ignoring");
        }
        return EmbeddingContexts::default();
    }

    let contexts = EmbeddingContexts::default().with_parent(Arc::new(WriterContext::stdout()));
    match opener_socket {
        Some(path) => with_opener_socket(contexts, path, config),
        None => contexts,
    }
}

#[cfg(unix)]
fn with_opener_socket(contexts: EmbeddingContexts, path: PathBuf, config: &Config) -> EmbeddingContexts {
    use sudoku_progress::SocketContext;

    let opener = SocketContext::new("opener", path, config.message.socket_timeout());
    contexts.with_opener(Arc::new(opener))
}

#[cfg(not(unix))]
fn with_opener_socket(contexts: EmbeddingContexts, path: PathBuf, _config: &Config) -> EmbeddingContexts {
    warn!(path = %path.display(), "Opener sockets are only supported on Unix, ignoring");
    contexts
}
