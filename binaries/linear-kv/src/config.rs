//! Service configuration.
//!
//! Configuration is read from an optional TOML file, then overridden by CLI
//! arguments. Every section falls back to its defaults when omitted.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use linear_kv_checker::{CheckSuite, LinearizabilityChecker, SessionChecker};
use linear_kv_report::TimelineRenderer;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server configuration.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Which checkers run on `/check` and `linear-kv check`.
    pub checker: CheckerConfig,

    /// Timeline rendering configuration.
    pub timeline: TimelineConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to.
    pub bind_addr: SocketAddr,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080)),
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    /// Returns the request timeout as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,

    /// Log format (pretty, json, compact).
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Checker selection. The register check always runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Also check read-your-writes per request id.
    pub read_your_writes: bool,

    /// Also check monotonic reads per request id.
    pub monotonic_reads: bool,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            read_your_writes: true,
            monotonic_reads: true,
        }
    }
}

impl CheckerConfig {
    /// Builds the configured checker suite.
    pub fn build_suite(&self) -> CheckSuite {
        let mut suite = CheckSuite::new().with_checker(LinearizabilityChecker::new());
        if self.read_your_writes {
            suite = suite.with_checker(SessionChecker::read_your_writes());
        }
        if self.monotonic_reads {
            suite = suite.with_checker(SessionChecker::monotonic_reads());
        }
        suite
    }
}

/// Timeline rendering configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Number of cells the history span is scaled onto.
    pub width: usize,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self { width: 60 }
    }
}

impl TimelineConfig {
    /// Builds the configured renderer.
    pub fn renderer(&self) -> TimelineRenderer {
        TimelineRenderer::new().with_width(self.width)
    }
}

impl AppConfig {
    /// Loads configuration from a file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Merges CLI arguments into the configuration.
    pub fn merge_cli_args(&mut self, args: &super::CliArgs) {
        if let Some(bind_addr) = args.bind_addr {
            self.server.bind_addr = bind_addr;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("Invalid log level: {}", self.logging.level);
        }

        let valid_formats = ["pretty", "json", "compact"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            anyhow::bail!("Invalid log format: {}", self.logging.format);
        }

        if self.server.request_timeout_secs == 0 {
            anyhow::bail!("Request timeout must be at least one second");
        }

        if self.timeline.width == 0 {
            anyhow::bail!("Timeline width must be positive");
        }

        Ok(())
    }
}
