use std::error::Error as StdError;

/// Crate-wide result type for chat session operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed session errors shared by every chat platform implementation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Login was rejected or could not be completed.
    #[error("authentication failed for {account_id}: {message}")]
    Authentication { account_id: String, message: String },

    /// Input payload or parameter is invalid.
    #[error("invalid session input: {message}")]
    InvalidInput { message: String },

    /// No factory is registered for the configured client type.
    #[error("client type \"{client_type}\" is not supported")]
    UnsupportedClientType { client_type: String },

    /// The inbound event stream ended without a shutdown request.
    #[error("event stream for {account_id} closed")]
    StreamClosed { account_id: String },

    /// Wrapped source error from the transport.
    #[error("session operation failed: {context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn authentication(account_id: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Authentication {
            account_id: account_id.into(),
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn invalid_input(message: impl std::fmt::Display) -> Self {
        Self::InvalidInput {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn unsupported(client_type: impl std::fmt::Display) -> Self {
        Self::UnsupportedClientType {
            client_type: client_type.to_string(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Whether this error came from the login step.
    #[must_use]
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }
}
