use thiserror::Error;

/// Failures of the process surroundings: the output stream, the vault root,
/// the vault watcher and log setup.
#[derive(Debug, Error)]
pub enum InfraError {
    /// Writing the document or waiting for a shutdown signal.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot set up logging: {0}")]
    Telemetry(String),
    /// The configured vault cannot be used.
    #[error("configuration error: {message}")]
    Configuration { message: String },
    #[error("cannot watch the vault: {message}")]
    Watch { message: String },
}

impl InfraError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }

    pub fn watch(message: impl Into<String>) -> Self {
        Self::Watch {
            message: message.into(),
        }
    }
}
