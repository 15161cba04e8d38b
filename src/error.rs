//! Error taxonomy for the catalog client.

use thiserror::Error;

/// Message shown when login fails without a server explanation.
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Message shown when the login request never got a response.
pub const LOGIN_UNREACHABLE: &str = "An error occurred. Please try again.";

/// Failures surfaced by the session, catalog and admin workflows.
///
/// Each variant carries a message that can be shown to the user as-is.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad credentials, or a protected call rejected with 401/403.
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// Listing the catalog failed.
    #[error("failed to fetch books: {message}")]
    Fetch { message: String },

    /// Create or update was rejected, locally or by the service.
    #[error("failed to save book: {message}")]
    Save { message: String },

    #[error("failed to delete book: {message}")]
    Delete { message: String },

    /// No response was received.
    #[error("network error: {message}")]
    Network { message: String },

    /// The local session file could not be read or written.
    #[error("session storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl Error {
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch {
            message: message.into(),
        }
    }

    pub fn save(message: impl Into<String>) -> Self {
        Self::Save {
            message: message.into(),
        }
    }

    pub fn delete(message: impl Into<String>) -> Self {
        Self::Delete {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// The bare message, without the kind prefix used by `Display`.
    pub fn user_message(&self) -> String {
        match self {
            Error::Auth { message }
            | Error::Fetch { message }
            | Error::Save { message }
            | Error::Delete { message }
            | Error::Network { message } => message.clone(),
            Error::Storage(e) => e.to_string(),
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Auth { .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_but_user_message_does_not() {
        let error = Error::auth(INVALID_CREDENTIALS);
        assert_eq!(error.to_string(), "authentication failed: Invalid credentials");
        assert_eq!(error.user_message(), "Invalid credentials");
        assert!(error.is_auth());
    }

    #[test]
    fn io_errors_become_storage_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let error: Error = io.into();
        assert!(matches!(error, Error::Storage(_)));
        assert!(!error.is_auth());
    }
}
