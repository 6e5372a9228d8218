//! Modem access
//!
//! The modem is queried by running its control program once per AT command.
//! Command failures never escape this module: they are rendered into the
//! page text by [`ModemDiagnostics`].

mod command;
mod diagnostics;

pub use command::AtCommandRunner;
pub use diagnostics::ModemDiagnostics;
