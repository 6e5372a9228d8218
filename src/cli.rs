//! Command-line interface

use std::path::PathBuf;

use clap::Parser;

/// Serve cellular modem signal statistics over HTTP
#[derive(Parser, Debug)]
#[command(name = "modem-stats")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "MODEM_STATS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port number to listen on [default: 8080]
    #[arg(
        short,
        long,
        env = "MODEM_STATS_PORT",
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub port: Option<u16>,

    /// Host to bind to [default: 0.0.0.0]
    #[arg(long, env = "MODEM_STATS_HOST")]
    pub host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MODEM_STATS_LOG_LEVEL")]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "MODEM_STATS_LOG_FORMAT")]
    pub log_format: Option<String>,
}
