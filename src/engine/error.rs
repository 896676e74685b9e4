use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors surfaced by a simulation engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("simulation configuration not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("failed to launch engine binary {binary}: {source}")]
    Launch {
        binary: String,
        #[source]
        source: io::Error,
    },

    #[error("engine exited before accepting connections ({status})")]
    EngineExited { status: ExitStatus },

    #[error("could not connect to engine on port {port} after {attempts} attempts")]
    Connect { port: u16, attempts: u32 },

    #[error("engine rejected command 0x{command:02x}: {description}")]
    CommandFailed { command: u8, description: String },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("I/O error talking to engine: {0}")]
    Io(#[from] io::Error),
}
