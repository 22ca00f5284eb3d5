use bytes::{Bytes, BytesMut};
use futures::stream::{Stream, TryStreamExt};
use serde::Serialize;
use std::io;
use std::pin::Pin;

use crate::error::ClientError;

pub type BoxStream<T> = Pin<Box<dyn Stream<Item = T> + Send + 'static>>;

/// Request body. Always buffered in full before invocation.
#[derive(Default)]
pub enum Body {
    /// Empty body
    #[default]
    Empty,
    /// Buffered bytes
    Bytes(Bytes),
    /// Streaming body, drained into memory when the request is sent
    Stream(BoxStream<Result<Bytes, io::Error>>),
}

impl std::fmt::Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Body::Empty => write!(f, "Body::Empty"),
            Body::Bytes(bytes) => f.debug_tuple("Body::Bytes").field(&bytes.len()).finish(),
            Body::Stream(_) => write!(f, "Body::Stream(..)"),
        }
    }
}

impl Body {
    #[must_use]
    pub fn empty() -> Self {
        Body::Empty
    }

    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Body::Bytes(bytes.into())
    }

    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, io::Error>> + Send + 'static,
    {
        Body::Stream(Box::pin(stream))
    }

    /// Create a body from a JSON-serializable value
    ///
    /// # Errors
    /// Returns [`ClientError::Build`] if `value` cannot be serialized.
    pub fn from_json<T: Serialize>(value: &T) -> Result<Self, ClientError> {
        let json = serde_json::to_vec(value)
            .map_err(|e| ClientError::Build(format!("Invalid JSON body: {e}")))?;
        Ok(Body::Bytes(Bytes::from(json)))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }

    /// Read the whole body into memory.
    ///
    /// # Errors
    /// Returns the first error yielded by a streaming body.
    pub async fn collect(self) -> Result<Bytes, io::Error> {
        match self {
            Body::Empty => Ok(Bytes::new()),
            Body::Bytes(bytes) => Ok(bytes),
            Body::Stream(stream) => {
                let buf = stream
                    .try_fold(BytesMut::new(), |mut buf, chunk| async move {
                        buf.extend_from_slice(&chunk);
                        Ok::<_, io::Error>(buf)
                    })
                    .await?;
                Ok(buf.freeze())
            }
        }
    }

    /// Read the whole body and convert it to a string, replacing invalid UTF-8.
    ///
    /// # Errors
    /// Returns the first error yielded by a streaming body.
    pub async fn collect_string(self) -> Result<String, io::Error> {
        let bytes = self.collect().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl From<()> for Body {
    fn from((): ()) -> Self {
        Body::Empty
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Bytes(Bytes::from(s))
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Body::Bytes(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<Vec<u8>> for Body {
    fn from(v: Vec<u8>) -> Self {
        Body::Bytes(Bytes::from(v))
    }
}

impl From<Bytes> for Body {
    fn from(b: Bytes) -> Self {
        Body::Bytes(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[tokio::test]
    async fn test_collect_stream_concatenates_chunks() {
        let body = Body::from_stream(stream::iter(vec![
            Ok(Bytes::from_static(b"hel")),
            Ok(Bytes::from_static(b"lo")),
        ]));
        assert_eq!(body.collect_string().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_collect_stream_surfaces_read_error() {
        let body = Body::from_stream(stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "cut off")),
        ]));
        let err = body.collect().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_empty_collects_to_empty_string() {
        assert_eq!(Body::empty().collect_string().await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_replaced() {
        let body = Body::from(vec![b'o', b'k', 0xff]);
        assert_eq!(body.collect_string().await.unwrap(), "ok\u{fffd}");
    }
}
