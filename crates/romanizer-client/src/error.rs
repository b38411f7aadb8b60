//! Error types for the coordination core.

use std::error::Error;

use thiserror::Error;

/// Primary error type for API and coordination operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or HTTP-level failure, including undecodable bodies.
    #[error("transport failure")]
    Transport {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The server answered but rejected the request.
    #[error("server rejected request")]
    Server {
        /// Operation identifier.
        operation: &'static str,
        /// HTTP status when the rejection came with a non-success code.
        status: Option<u16>,
        /// Message supplied by the server, if any.
        message: Option<String>,
    },
    /// The requested resource does not exist.
    #[error("resource not found")]
    NotFound {
        /// Operation identifier.
        operation: &'static str,
        /// Identifier that could not be resolved.
        resource: String,
    },
    /// The request was rejected before being sent.
    #[error("invalid request")]
    InvalidRequest {
        /// Operation identifier.
        operation: &'static str,
        /// Machine-readable reason for the rejection.
        reason: &'static str,
    },
}

impl ClientError {
    /// Wrap a transport-level failure.
    pub fn transport(
        operation: &'static str,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self::Transport {
            operation,
            source: source.into(),
        }
    }

    /// Operation identifier associated with the failure.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Transport { operation, .. }
            | Self::Server { operation, .. }
            | Self::NotFound { operation, .. }
            | Self::InvalidRequest { operation, .. } => operation,
        }
    }

    /// Whether the failure happened below the application protocol.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Text suitable for a user notification: the server's own message when it
    /// supplied one, otherwise `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Server {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// Convenience alias for coordination results.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn user_message_prefers_server_text() {
        let err = ClientError::Server {
            operation: "favorites.add_bulk",
            status: Some(400),
            message: Some("Missing cache_keys".to_string()),
        };
        assert_eq!(err.user_message("fallback"), "Missing cache_keys");
        assert_eq!(err.operation(), "favorites.add_bulk");
        assert!(!err.is_transport());
    }

    #[test]
    fn user_message_falls_back_for_blank_and_transport() {
        let blank = ClientError::Server {
            operation: "playlist.rename",
            status: None,
            message: Some("  ".to_string()),
        };
        assert_eq!(blank.user_message("Failed to rename."), "Failed to rename.");

        let transport = ClientError::transport("track.status", io::Error::other("reset"));
        assert!(transport.is_transport());
        assert_eq!(transport.user_message("generic"), "generic");
        assert_eq!(transport.to_string(), "transport failure");
        assert!(std::error::Error::source(&transport).is_some());
    }
}
