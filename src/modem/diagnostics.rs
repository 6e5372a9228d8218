//! Diagnostics provider backed by modem AT commands

use async_trait::async_trait;
use tracing::debug;

use super::command::AtCommandRunner;
use crate::cache::DiagnosticsProvider;
use crate::config::{ModemConfig, PageConfig};
use crate::page;

/// Runs every configured AT command and renders the results as one page
pub struct ModemDiagnostics {
    runner: AtCommandRunner,
    commands: Vec<String>,
    page: PageConfig,
}

impl ModemDiagnostics {
    /// Create a provider from the modem and page settings
    #[must_use]
    pub fn new(modem: &ModemConfig, page: PageConfig) -> Self {
        Self {
            runner: AtCommandRunner::new(modem),
            commands: modem.commands.clone(),
            page,
        }
    }
}

#[async_trait]
impl DiagnosticsProvider for ModemDiagnostics {
    async fn collect(&self) -> String {
        // Sequential: the modem serves one AT command at a time.
        let mut sections = Vec::with_capacity(self.commands.len());
        for command in &self.commands {
            let result = self.runner.run(command).await;
            if let Err(ref e) = result {
                debug!(command = %command, error = %e, "Modem command failed");
            }
            sections.push(page::section(&result));
        }
        page::render(&self.page, &sections)
    }
}
