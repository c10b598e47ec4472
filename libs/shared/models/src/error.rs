use thiserror::Error;

/// Fallback shown when a remote failure carries no usable message.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl ClientError {
    /// Text suitable for an error banner. Server messages pass through verbatim.
    pub fn display_message(&self) -> String {
        let message = match self {
            ClientError::Validation(msg)
            | ClientError::NotFound(msg)
            | ClientError::AuthFailed(msg)
            | ClientError::Unauthorized(msg)
            | ClientError::Transport(msg)
            | ClientError::InvalidState(msg) => msg,
            ClientError::Server { message, .. } => message,
        };

        if message.trim().is_empty() {
            GENERIC_FAILURE_MESSAGE.to_string()
        } else {
            message.clone()
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }

    /// True for errors raised before any request left the client.
    pub fn is_local(&self) -> bool {
        matches!(self, ClientError::Validation(_) | ClientError::InvalidState(_))
    }
}
