use bytes::Bytes;
use http::StatusCode;
use serde::de::DeserializeOwned;

use crate::body::BoxStream;
use crate::envelope::ResponsePayload;
use crate::error::ClientError;
use crate::policy::EnvelopeHeaders;

/// HTTP response rebuilt from a function's response envelope.
///
/// Functions return single-valued headers, so every header name maps to
/// exactly one value. Status and header names are kept as the function sent
/// them.
#[derive(Debug, Clone)]
pub struct Response {
    status_code: i64,
    headers: EnvelopeHeaders,
    body: Bytes,
}

impl Response {
    #[must_use]
    pub fn new(status_code: i64, headers: EnvelopeHeaders, body: Bytes) -> Self {
        Self {
            status_code,
            headers,
            body,
        }
    }

    /// Rebuild a response from a decoded envelope.
    #[must_use]
    pub fn from_payload(payload: ResponsePayload) -> Self {
        Self::new(
            payload.status_code,
            payload.headers,
            Bytes::from(payload.body),
        )
    }

    /// Status code exactly as returned; `0` when the function sent none.
    #[must_use]
    pub fn status_code(&self) -> i64 {
        self.status_code
    }

    /// Status as an HTTP status code, `None` outside `100..=999`.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        u16::try_from(self.status_code)
            .ok()
            .and_then(|code| StatusCode::from_u16(code).ok())
    }

    #[must_use]
    pub fn headers(&self) -> &EnvelopeHeaders {
        &self.headers
    }

    /// Value of header `name`. An exact match wins over one that differs only
    /// in ASCII case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .or_else(|| {
                self.headers
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
            .map(String::as_str)
    }

    /// Consume the response and return the entire body as bytes
    #[must_use]
    pub fn bytes(self) -> Bytes {
        self.body
    }

    /// Consume the response and return the body as a string
    ///
    /// # Errors
    /// Returns [`ClientError::MalformedResponse`] if the body is not UTF-8.
    pub fn text(self) -> Result<String, ClientError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| ClientError::MalformedResponse(format!("Invalid UTF-8: {e}")))
    }

    /// Consume the response and deserialize the body as JSON
    ///
    /// # Errors
    /// Returns [`ClientError::MalformedResponse`] if the body does not decode into `T`.
    pub fn json<T: DeserializeOwned>(self) -> Result<T, ClientError> {
        serde_json::from_slice(&self.body).map_err(|e| ClientError::malformed("response body", &e))
    }

    /// Convert the body into a single-chunk byte stream
    #[must_use]
    pub fn into_stream(self) -> BoxStream<Result<Bytes, ClientError>> {
        let body = self.body;
        Box::pin(futures::stream::once(async move { Ok(body) }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn payload(status_code: i64, headers: &[(&str, &str)], body: &str) -> ResponsePayload {
        ResponsePayload {
            body: body.to_owned(),
            status_code,
            headers: headers
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
        }
    }

    #[test]
    fn test_from_payload_copies_status_headers_body() {
        let response = Response::from_payload(payload(404, &[("X-Test", "v")], "hello"));
        assert_eq!(response.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(response.status_code(), 404);
        assert_eq!(response.header("X-Test"), Some("v"));
        assert_eq!(response.headers().len(), 1);
        assert_eq!(response.text().unwrap(), "hello");
    }

    #[test]
    fn test_header_names_keep_their_spelling() {
        let response = Response::from_payload(payload(200, &[("X-Test", "v")], ""));
        let names: Vec<&str> = response.headers().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["X-Test"]);
        assert_eq!(response.header("x-test"), Some("v"));
        assert_eq!(response.header("x-other"), None);
    }

    #[test]
    fn test_exact_header_name_wins() {
        let response = Response::from_payload(payload(200, &[("ETag", "a"), ("etag", "b")], ""));
        assert_eq!(response.header("etag"), Some("b"));
        assert_eq!(response.header("ETag"), Some("a"));
    }

    #[test]
    fn test_missing_status_is_kept_as_zero() {
        let response = Response::from_payload(payload(0, &[], "body"));
        assert_eq!(response.status_code(), 0);
        assert_eq!(response.status(), None);
        assert_eq!(response.text().unwrap(), "body");
    }

    #[test]
    fn test_out_of_range_status_is_kept() {
        assert_eq!(
            Response::from_payload(payload(70_000, &[], "")).status_code(),
            70_000
        );
        assert_eq!(Response::from_payload(payload(-1, &[], "")).status(), None);
    }

    #[test]
    fn test_header_name_outside_http_grammar_is_kept() {
        let response = Response::from_payload(payload(200, &[("bad name", "v")], ""));
        assert_eq!(response.header("bad name"), Some("v"));
    }

    #[test]
    fn test_json_body() {
        let response = Response::from_payload(payload(200, &[], r#"{"ok":true}"#));
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["ok"], true);
    }

    #[tokio::test]
    async fn test_into_stream_yields_whole_body() {
        let response = Response::from_payload(payload(200, &[], "chunk"));
        let mut stream = response.into_stream();
        assert_eq!(
            stream.next().await.unwrap().unwrap(),
            Bytes::from_static(b"chunk")
        );
        assert!(stream.next().await.is_none());
    }
}
