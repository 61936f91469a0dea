use std::process::ExitCode;

/// Errors that cause issuebot to exit with a specific code.
#[derive(Debug, thiserror::Error)]
pub enum ExitError {
    #[error("config error: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("tracker probe failed: {0}")]
    Probe(String),
}

impl ExitError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) => ExitCode::from(2),
            Self::Transport(_) => ExitCode::from(3),
            Self::Probe(_) => ExitCode::from(4),
        }
    }
}
