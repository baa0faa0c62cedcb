//! CLI entry point for stylewatch.
//!
//! Watches a stylesheet entry point together with everything it imports and
//! re-runs a compile pipeline whenever any of those files changes.
//!
//! # Usage
//!
//! ```bash
//! stylewatch [OPTIONS] <INPUT>
//!
//! # Copy the entry point to an output file on every change
//! stylewatch src/main.scss -o dist/main.css
//!
//! # Pipe the entry point through a compiler
//! stylewatch src/main.scss -o dist/main.css -c "sassc --stdin" -I vendor/styles
//!
//! # Print one JSON line per notification with the watched files
//! stylewatch src/main.scss --json -vv
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod pipeline;

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use serde::Serialize;
use sw_core::{Config, RelevantExtensions, Verbosity, WatchSet};
use sw_watcher::{Notification, StyleWatcher};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::pipeline::Pipeline;

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Watches a stylesheet and everything it imports.
///
/// Runs the compile pipeline once at startup and again whenever the entry
/// point or any file it transitively imports changes, including when a new
/// file appears that satisfies an import.
#[derive(Parser, Debug)]
#[command(name = "stylewatch", version, about, long_about = None)]
struct Cli {
    /// Entry point stylesheet.
    #[arg(value_name = "INPUT")]
    input: Utf8PathBuf,

    /// Output file (defaults to stdout).
    #[arg(short, long, env = "STYLEWATCH_OUTPUT")]
    output: Option<Utf8PathBuf>,

    /// Directory watched for new and removed stylesheets.
    ///
    /// Defaults to the current directory.
    #[arg(short = 'r', long = "root-dir", env = "STYLEWATCH_ROOT_DIR")]
    root_dir: Option<Utf8PathBuf>,

    /// Shell command the input is piped through (stdin to stdout).
    #[arg(short, long, env = "STYLEWATCH_COMMAND")]
    command: Option<String>,

    /// Additional import search path (repeatable).
    #[arg(short = 'I', long = "include-path", value_name = "DIR")]
    include_paths: Vec<Utf8PathBuf>,

    /// Relevant file extension without the dot (repeatable).
    ///
    /// Defaults to `scss`, `sass` and `css`.
    #[arg(short, long = "extension", value_name = "EXT")]
    extensions: Vec<String>,

    /// Increase verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Fail on imports that cannot be located instead of skipping them.
    #[arg(long)]
    strict_imports: bool,

    /// JSON configuration file.
    #[arg(long, env = "STYLEWATCH_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Disable colored output.
    #[arg(long)]
    no_color: bool,

    /// Print one JSON line per notification instead of running the pipeline.
    #[arg(long)]
    json: bool,
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise the level
/// follows the verbosity: `warn`, `info`, `debug`, `trace`. Logs go to stderr
/// so stdout stays free for compiled output.
fn init_tracing(verbosity: Verbosity, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match verbosity.level() {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        EnvFilter::new(format!("{level},mio=warn,notify=warn"))
    });

    // Check if colors should be disabled (flag or NO_COLOR env var)
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(use_ansi)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Builds a [`Config`] from the config file and CLI arguments.
///
/// Flags override values from the file; include paths are appended.
///
/// # Errors
///
/// Returns an error if the config file cannot be loaded or the root
/// directory is not a directory.
fn build_config(cli: &Cli) -> color_eyre::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to load config {}: {}", path, e))?,
        None => Config::default(),
    };

    let options = &mut config.options;
    if let Some(root) = &cli.root_dir {
        if !root.is_dir() {
            return Err(color_eyre::eyre::eyre!("Root path is not a directory: {}", root));
        }
        options.scope_root = Some(root.clone());
    }
    options.search_paths.extend(cli.include_paths.iter().cloned());
    if !cli.extensions.is_empty() {
        options.extensions = RelevantExtensions::new(cli.extensions.iter().map(String::as_str));
    }
    if cli.verbose > 0 {
        options.verbosity = Verbosity::new(cli.verbose);
    }
    options.strict_imports |= cli.strict_imports;

    Ok(config)
}

// =============================================================================
// COMMAND IMPLEMENTATION
// =============================================================================

/// Watches the input until interrupted.
///
/// # Errors
///
/// Returns an error if the watcher cannot start or stops on a fatal error.
async fn run_watch(cli: &Cli, config: Config) -> color_eyre::Result<()> {
    let pipeline = Pipeline::new(cli.input.clone(), cli.output.clone(), cli.command.clone());

    let mut watcher = StyleWatcher::new([pipeline.input()], config.options)?;
    let mut notifications = watcher.subscribe();
    watcher.start(&config.watch).await?;

    info!(input = %pipeline.input(), files = watcher.included_files().len(), "Watching");

    let outcome = serve(&watcher, &mut notifications, &pipeline, cli.json).await;
    watcher.shutdown().await?;
    outcome
}

/// Handles notifications until a shutdown signal arrives.
async fn serve(
    watcher: &StyleWatcher,
    notifications: &mut mpsc::UnboundedReceiver<Notification>,
    pipeline: &Pipeline,
    json: bool,
) -> color_eyre::Result<()> {
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                result?;
                info!("Shutting down");
                return Ok(());
            }
            notification = notifications.recv() => {
                let Some(notification) = notification else {
                    return Ok(());
                };
                handle_notification(&notification, watcher, pipeline, json).await?;
            }
        }
    }
}

async fn handle_notification(
    notification: &Notification,
    watcher: &StyleWatcher,
    pipeline: &Pipeline,
    json: bool,
) -> color_eyre::Result<()> {
    if json {
        let files = watcher.included_files();
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{}", json_line(notification, &files)?)?;
        return Ok(());
    }

    match notification {
        Notification::Init | Notification::Update => {
            if let Err(error) = pipeline.run().await {
                tracing::error!(error = %error, "Pipeline failed");
            }
        }
        Notification::Error(message) => tracing::error!("{message}"),
    }

    Ok(())
}

/// Completes on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() -> color_eyre::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
    }

    Ok(())
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

/// Formats a notification as a single JSON line.
fn json_line(notification: &Notification, files: &WatchSet) -> color_eyre::Result<String> {
    #[derive(Serialize)]
    struct Line<'a> {
        event: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<&'a str>,
        files: Vec<&'a Utf8Path>,
    }

    let message = match notification {
        Notification::Error(message) => Some(message.as_str()),
        Notification::Init | Notification::Update => None,
    };

    let line = Line {
        event: notification.as_str(),
        message,
        files: files.sorted(),
    };
    serde_json::to_string(&line)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to serialize JSON: {}", e))
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Merge the config file with the flags
    let config = build_config(&cli)?;

    // 4. Initialize tracing (handles --no-color for log output)
    init_tracing(config.options.verbosity, cli.no_color);

    // 5. Watch until interrupted
    run_watch(&cli, config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("stylewatch").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_requires_exactly_one_input() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["a.scss", "b.scss"]).is_err());
        assert!(parse(&["a.scss"]).is_ok());
    }

    #[test]
    fn test_rejects_repeated_output() {
        assert!(parse(&["a.scss", "-o", "a.css", "-o", "b.css"]).is_err());
    }

    #[test]
    fn test_repeatable_flags_accumulate() {
        let cli = parse(&["a.scss", "-I", "vendor", "-I", "lib", "-e", "css", "-vv"]).expect("parse");
        assert_eq!(cli.include_paths, vec![Utf8PathBuf::from("vendor"), Utf8PathBuf::from("lib")]);
        assert_eq!(cli.extensions, vec!["css".to_owned()]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let root = Utf8Path::from_path(dir.path()).expect("Invalid path");
        let config_path = root.join("stylewatch.json");
        std::fs::write(
            &config_path,
            r#"{"watch": {"debounce_ms": 10}, "options": {"verbosity": 1, "search_paths": ["shared"]}}"#,
        )
        .expect("write config");

        let cli = parse(&[
            "a.scss",
            "--config",
            config_path.as_str(),
            "-I",
            "vendor",
            "-e",
            "css",
            "-vvv",
            "-r",
            root.as_str(),
        ])
        .expect("parse");
        let config = build_config(&cli).expect("config");

        assert_eq!(config.watch.debounce_ms, 10);
        assert_eq!(config.options.verbosity.level(), 3);
        assert_eq!(
            config.options.search_paths,
            vec![Utf8PathBuf::from("shared"), Utf8PathBuf::from("vendor")]
        );
        assert!(config.options.extensions.contains("css"));
        assert!(!config.options.extensions.contains("scss"));
        assert_eq!(config.options.scope_root.as_deref(), Some(root));
    }

    #[test]
    fn test_root_dir_must_be_a_directory() {
        let cli = parse(&["a.scss", "-r", "/nonexistent/stylewatch/root"]).expect("parse");
        assert!(build_config(&cli).is_err());
    }

    #[test]
    fn test_json_line_lists_sorted_files() {
        let files: WatchSet = ["/p/b.scss", "/p/a.scss"].into_iter().map(Utf8PathBuf::from).collect();

        let line = json_line(&Notification::Update, &files).expect("json");
        assert_eq!(line, r#"{"event":"update","files":["/p/a.scss","/p/b.scss"]}"#);

        let line = json_line(&Notification::Error("boom".into()), &WatchSet::default()).expect("json");
        assert_eq!(line, r#"{"event":"error","message":"boom","files":[]}"#);
    }
}
