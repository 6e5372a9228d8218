//! AT command execution through the modem control program

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::config::ModemConfig;
use crate::error::CommandError;

/// Runs `program args... <AT command>` and captures its standard output
#[derive(Debug, Clone)]
pub struct AtCommandRunner {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl AtCommandRunner {
    /// Create a runner for the configured modem program
    #[must_use]
    pub fn new(config: &ModemConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            timeout: config.timeout,
        }
    }

    /// Execute one AT command and return its raw output.
    ///
    /// The child is killed if it outlives the timeout.
    pub async fn run(&self, at_command: &str) -> Result<String, CommandError> {
        if self.program.trim().is_empty() {
            return Err(CommandError::EmptyProgram);
        }

        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(at_command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CommandError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| CommandError::Timeout(self.timeout))?
            .map_err(|source| CommandError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CommandError::Exit(output.status));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
