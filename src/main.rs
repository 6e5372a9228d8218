//! modem-stats - cellular modem signal statistics over HTTP

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use modem_stats::{cli::Cli, config::Config, http::StatsServer, setup_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    let config = match Config::load(cli.config.as_deref()) {
        Ok(mut config) => {
            config.apply_cli(&cli);
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.server.port,
        "Starting modem-stats"
    );

    let server = match StatsServer::new(config) {
        Ok(s) => s,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server.run().await {
        error!("Server error: {e}");
        return ExitCode::FAILURE;
    }

    info!("Shutdown complete");
    ExitCode::SUCCESS
}
