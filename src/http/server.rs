//! Statistics server

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};

use super::router::{AppState, create_router};
use crate::cache::{ThrottlingCache, spawn_refresher};
use crate::config::Config;
use crate::modem::ModemDiagnostics;
use crate::{Error, Result};

/// Modem statistics HTTP server
pub struct StatsServer {
    /// Configuration
    config: Config,
    /// Throttled diagnostics page
    cache: Arc<ThrottlingCache>,
}

impl StatsServer {
    /// Create a server polling the configured modem
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let provider = Arc::new(ModemDiagnostics::new(&config.modem, config.page.clone()));
        let cache = Arc::new(ThrottlingCache::new(provider, config.cache.window));

        Ok(Self { config, cache })
    }

    /// Shared cache behind the `/` route
    #[must_use]
    pub fn cache(&self) -> &Arc<ThrottlingCache> {
        &self.cache
    }

    /// Bind and serve until Ctrl+C or SIGTERM
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::new(
            self.config
                .server
                .host
                .parse()
                .map_err(|e| Error::Config(format!("Invalid host: {e}")))?,
            self.config.server.port,
        );

        let (shutdown_tx, _) = broadcast::channel(1);

        let state = Arc::new(AppState {
            cache: Arc::clone(&self.cache),
        });
        let app = create_router(state);

        let listener = TcpListener::bind(addr).await?;

        info!(
            host = %self.config.server.host,
            port = self.config.server.port,
            "Listening. Press Ctrl+C to exit"
        );
        info!(
            window = ?self.config.cache.window,
            background_refresh = self.config.cache.background_refresh,
            program = %self.config.modem.program,
            commands = ?self.config.modem.commands,
            "Polling modem"
        );

        let refresher = self
            .config
            .cache
            .background_refresh
            .then(|| spawn_refresher(Arc::clone(&self.cache), shutdown_tx.subscribe()));

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(shutdown_tx))
            .await
            .map_err(|e| Error::Internal(e.to_string()))?;

        if let Some(handle) = refresher
            && let Err(e) = handle.await
        {
            error!(error = %e, "Background refresh task failed");
        }

        let stats = self.cache.stats();
        info!(
            hits = stats.hits,
            misses = stats.misses,
            hit_rate = stats.hit_rate,
            "Cache statistics"
        );

        Ok(())
    }
}

/// Shutdown signal handler
async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(matches!(StatsServer::new(config), Err(Error::Config(_))));
    }

    #[test]
    fn test_new_uses_configured_window() {
        let mut config = Config::default();
        config.cache.window = std::time::Duration::from_secs(2);
        let server = StatsServer::new(config).unwrap();
        assert_eq!(server.cache().window(), std::time::Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_run_rejects_invalid_host() {
        let mut config = Config::default();
        config.server.host = "not a host".to_string();
        let server = StatsServer::new(config).unwrap();
        assert!(matches!(server.run().await, Err(Error::Config(_))));
    }
}
