use bytes::Bytes;

use crate::error::ClientError;

/// One synchronous function invocation.
///
/// Implementations must not retry and must not add their own deadline beyond
/// what they were configured with. Dropping the returned future cancels the call.
#[async_trait::async_trait]
pub trait Invoker: Send + Sync {
    /// Invoke `function` with `payload` and return its raw response payload.
    ///
    /// # Errors
    /// Returns [`ClientError::Invocation`] if the transport fails or the function
    /// reports a function error.
    async fn invoke(&self, function: &str, payload: Bytes) -> Result<Bytes, ClientError>;
}
