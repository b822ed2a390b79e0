//! Error types for repository access

use thiserror::Error;

/// Failures talking to the plugin repository.
///
/// Everything except [`RepositoryError::ClientTooOld`] can be retried by the
/// user; the version gate holds for the rest of the session.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Could not reach the plugin repository: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Plugin repository is unavailable (HTTP {status})")]
    Unavailable { status: u16 },

    #[error("This version of plugvault is no longer supported by the plugin repository. Please update.")]
    ClientTooOld,

    #[error("Malformed response from plugin repository: {0}")]
    MalformedResponse(String),

    #[error("Invalid repository URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RepositoryError {
    /// Whether the error should end all repository access for the session
    pub fn is_fatal(&self) -> bool {
        matches!(self, RepositoryError::ClientTooOld)
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        RepositoryError::MalformedResponse(message.into())
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
