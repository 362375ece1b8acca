use thiserror::Error;

/// Failures of the portal operations (license checks, report and complaint submission).
///
/// Plumbing around these operations (config files, attachment IO, CLI) reports through
/// `anyhow` instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PortalError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("FSSAI number {identifier} not found in registry")]
    NotFound { identifier: String },

    #[error("License {identifier} is marked as {reason}")]
    Flagged { identifier: String, reason: String },

    #[error("{}", transport_message(.status, .message))]
    Transport { status: Option<u16>, message: String },

    #[error("Request timed out")]
    TimedOut,

    #[error("You must be signed in to continue")]
    Unauthenticated,

    #[error("Administrator access required")]
    Forbidden,
}

fn transport_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(status) => format!("Request failed: {status} - {message}"),
        None => format!("Request failed: {message}"),
    }
}

impl PortalError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Errors the user can clear by triggering the same action again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::TimedOut)
    }
}

impl From<reqwest::Error> for PortalError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::TimedOut;
        }
        Self::Transport {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

pub type PortalResult<T> = std::result::Result<T, PortalError>;
