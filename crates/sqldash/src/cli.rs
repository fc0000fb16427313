use std::{path::PathBuf, time::Duration};

use clap::Parser;

/// Query the console service runs when none is supplied.
pub const DEFAULT_QUERY: &str =
    "SELECT memory_usage, cpu_usage, timestamp FROM stats ORDER BY timestamp DESC LIMIT 100;";

pub const DEFAULT_REFRESH_MS: u64 = 2000;

#[derive(Parser, Debug, Clone)]
#[command(name = "sqldash", about = "Terminal dashboard for the metrics SQL console")]
pub struct Args {
    /// Console service URL (the /api/query endpoint).
    #[arg(long, default_value = "http://127.0.0.1:8082/api/query")]
    pub endpoint: String,

    /// Query run once at startup and kept in the input line.
    #[arg(long, default_value = DEFAULT_QUERY)]
    pub query: String,

    /// Live refresh interval in milliseconds. 0 falls back to the default.
    #[arg(long, default_value_t = DEFAULT_REFRESH_MS)]
    pub refresh_ms: u64,

    /// Start with live refresh enabled.
    #[arg(long)]
    pub live: bool,

    /// Use a simulated in-process backend instead of the network.
    #[arg(long)]
    pub demo: bool,

    /// Run the query once, write the rows to this CSV file, and exit.
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Soft timeout for a single request.
    #[arg(long, default_value_t = 30_000)]
    pub timeout_ms: u64,

    /// Logging level (stderr). Also supports RUST_LOG.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Write logs to this file instead of stderr.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Args {
    pub fn refresh_interval(&self) -> Duration {
        let ms = if self.refresh_ms == 0 {
            DEFAULT_REFRESH_MS
        } else {
            self.refresh_ms
        };
        Duration::from_millis(ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_refresh_falls_back_to_default() {
        let args = Args::parse_from(["sqldash", "--refresh-ms", "0"]);
        assert_eq!(args.refresh_interval(), Duration::from_millis(2000));
    }

    #[test]
    fn refresh_defaults_to_two_seconds() {
        let args = Args::parse_from(["sqldash"]);
        assert_eq!(args.refresh_interval(), Duration::from_millis(2000));
    }
}
