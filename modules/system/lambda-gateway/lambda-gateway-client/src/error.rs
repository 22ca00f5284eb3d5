use std::io;
use thiserror::Error;

/// Errors returned by gateway client operations.
///
/// Every variant is terminal for the call that produced it; nothing is retried.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The routing string has no `/` separating the function from the path.
    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    /// The request could not be assembled (bad header name/value, missing route).
    #[error("Request build error: {0}")]
    Build(String),

    /// The request body could not be read to completion.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The transport failed, or the invoked function reported a function error.
    #[error("Invocation error: {0}")]
    Invocation(String),

    /// The response envelope or the GraphQL body inside it could not be decoded.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The GraphQL backend reported errors. Carries only the first message.
    #[error("{0}")]
    Remote(String),

    /// Transport configuration or credentials could not be resolved.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    pub(crate) fn malformed(context: &str, err: &serde_json::Error) -> Self {
        ClientError::MalformedResponse(format!("{context}: {err}"))
    }
}
