//! Modem signal statistics over HTTP
//!
//! Runs a fixed set of AT commands against a cellular modem, renders the
//! output as an auto-refreshing HTML page and serves it on `GET /`.
//!
//! Browsers refresh the page every second and several may be open at once,
//! so the page is produced through a [`ThrottlingCache`]: the modem is
//! polled at most once per cache window no matter how many requests arrive.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod modem;
pub mod page;

pub use cache::{DiagnosticsProvider, ThrottlingCache};
pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => subscriber
            .with(fmt::layer().json())
            .try_init()
            .map_err(|e| Error::Internal(e.to_string())),
        _ => subscriber
            .with(fmt::layer())
            .try_init()
            .map_err(|e| Error::Internal(e.to_string())),
    }
}
