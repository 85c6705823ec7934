//! linear-kv - A strongly consistent key/value register over HTTP.
//!
//! Every `put` and `get` is recorded with the interval in which it ran, and
//! the recorded history can be checked for linearizability at any time.
//!
//! # Usage
//!
//! ```bash
//! # Serve on the default address (0.0.0.0:8080)
//! linear-kv
//!
//! # Serve with a configuration file and a different address
//! linear-kv --config /path/to/config.toml serve --bind-addr 127.0.0.1:9000
//!
//! # Check a history exported from /history
//! linear-kv check history.json
//!
//! # Render an exported history as a timeline
//! linear-kv timeline history.json
//! ```

mod config;
mod error;
mod routes;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::AppConfig;
use linear_kv_report::{check_report_to_json, history_from_file, CheckReport, JsonFormat};
use linear_kv_store::Store;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// CLI arguments for linear-kv.
#[derive(Parser, Debug)]
#[command(
    name = "linear-kv",
    about = "Linearizable key/value register with history recording and checking",
    version
)]
pub struct CliArgs {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to the configuration file.
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Address to bind the HTTP server to.
    #[arg(short, long, value_name = "ADDR", global = true)]
    bind_addr: Option<SocketAddr>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,

    /// Enable JSON log output.
    #[arg(long, global = true)]
    json_logs: bool,

    /// Print the effective configuration and exit.
    #[arg(long)]
    print_config: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Run the HTTP service (the default).
    Serve,
    /// Check an exported history and print the report as JSON.
    Check {
        /// History file, as served by /history.
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Render an exported history as an ASCII timeline.
    Timeline {
        /// History file, as served by /history.
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

/// Initialize tracing/logging. Logs go to stderr; stdout carries command output.
fn init_tracing(config: &config::LoggingConfig, json_logs: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .context("Failed to parse log filter")?;

    let format = if json_logs || config.format == "json" {
        "json"
    } else {
        &config.format
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
        }
        "compact" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
        }
    }

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

/// Runs the HTTP service until a shutdown signal arrives.
async fn serve(config: AppConfig) -> Result<()> {
    let state = routes::AppState::new(
        Arc::new(Store::new()),
        Arc::new(config.checker.build_suite()),
        config.timeline.renderer(),
    );
    let app = routes::build_router(state, config.server.request_timeout());

    let bind_addr = config.server.bind_addr;
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    info!(bind_addr = %bind_addr, "linear-kv listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("linear-kv stopped");
    Ok(())
}

/// Checks an exported history and prints the report. Returns whether the
/// history is linearizable.
fn check_file(path: &Path, config: &AppConfig) -> Result<bool> {
    let history = history_from_file(path)
        .with_context(|| format!("Failed to load history from {:?}", path))?;

    let result = config.checker.build_suite().check(&history);
    let report = CheckReport::new(&result, history.len());
    if !report.is_linearizable {
        warn!(violations = report.violations.len(), "history is not linearizable");
    }

    println!("{}", check_report_to_json(&report, JsonFormat::Pretty)?);
    Ok(report.is_linearizable)
}

/// Renders an exported history as a timeline on stdout.
fn timeline_file(path: &Path, config: &AppConfig) -> Result<()> {
    let history = history_from_file(path)
        .with_context(|| format!("Failed to load history from {:?}", path))?;

    print!("{}", config.timeline.renderer().render(&history));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = CliArgs::parse();

    let mut config = if let Some(ref config_path) = args.config {
        AppConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        AppConfig::default()
    };

    config.merge_cli_args(&args);

    if args.print_config {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(ExitCode::SUCCESS);
    }

    config.validate().context("Invalid configuration")?;

    init_tracing(&config.logging, args.json_logs)?;

    match args.command.clone().unwrap_or(Command::Serve) {
        Command::Serve => {
            info!(version = env!("CARGO_PKG_VERSION"), "linear-kv starting");
            if let Err(e) = serve(config).await {
                error!(error = %e, "linear-kv failed");
                return Err(e);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { file } => {
            if check_file(&file, &config)? {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Timeline { file } => {
            timeline_file(&file, &config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_args_parsing() {
        let args = CliArgs::parse_from(["linear-kv"]);
        assert!(args.command.is_none());
        assert!(args.config.is_none());
        assert!(!args.json_logs);
        assert!(!args.print_config);
    }

    #[test]
    fn test_cli_args_with_options() {
        let args = CliArgs::parse_from([
            "linear-kv",
            "serve",
            "--bind-addr",
            "127.0.0.1:9000",
            "--log-level",
            "debug",
            "--json-logs",
        ]);

        assert_eq!(args.command, Some(Command::Serve));
        assert_eq!(args.bind_addr, Some("127.0.0.1:9000".parse().unwrap()));
        assert_eq!(args.log_level, Some("debug".to_string()));
        assert!(args.json_logs);
    }

    #[test]
    fn test_cli_subcommands() {
        let args = CliArgs::parse_from(["linear-kv", "check", "history.json"]);
        assert_eq!(
            args.command,
            Some(Command::Check {
                file: PathBuf::from("history.json")
            })
        );

        let args = CliArgs::parse_from(["linear-kv", "-c", "kv.toml", "timeline", "h.json"]);
        assert_eq!(args.config, Some(PathBuf::from("kv.toml")));
        assert!(matches!(args.command, Some(Command::Timeline { .. })));

        assert!(CliArgs::try_parse_from(["linear-kv", "check"]).is_err());
    }

    #[test]
    fn test_config_merge() {
        let mut config = AppConfig::default();
        let args = CliArgs::parse_from([
            "linear-kv",
            "--bind-addr",
            "127.0.0.1:1234",
            "--log-level",
            "warn",
        ]);

        config.merge_cli_args(&args);

        assert_eq!(config.server.bind_addr.port(), 1234);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_check_file() {
        let store = Store::new();
        store.put("1", "a", "x").unwrap();
        store.get("a", Some("c1")).unwrap();

        let path = std::env::temp_dir().join(format!("linear-kv-history-{}.json", std::process::id()));
        let json = linear_kv_report::history_to_json(&store.history(), JsonFormat::Pretty).unwrap();
        std::fs::write(&path, json).unwrap();

        let linearizable = check_file(&path, &AppConfig::default()).unwrap();
        timeline_file(&path, &AppConfig::default()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(linearizable);
        assert!(check_file(&path, &AppConfig::default()).is_err());
    }
}
