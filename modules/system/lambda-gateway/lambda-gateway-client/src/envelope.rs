//! Wire shapes exchanged with the invoked function.
//!
//! Outbound, the function receives a [`RequestEnvelope`] in the API Gateway
//! proxy-event layout. Inbound, it answers with a [`ResponsePayload`]; on the
//! GraphQL path the payload body holds a [`GraphQlResponse`].

use std::collections::BTreeMap;

use bytes::Bytes;
use http::Method;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::ClientError;
use crate::policy::{EnvelopeHeaders, Principal, merge_caller_headers};
use crate::request::CallerHeaders;

/// Serialize internal, well-formed data.
///
/// Everything routed through here is string maps and JSON values, so a failure
/// is a defect in this crate rather than a runtime condition.
pub fn encode_json<T: Serialize + ?Sized>(what: &str, value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(json) => json,
        Err(err) => {
            tracing::error!(error = %err, "failed to encode {what}");
            panic!("failed to encode {what}: {err}");
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Invocation payload describing one HTTP-shaped request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    pub headers: EnvelopeHeaders,
    pub path: String,
    pub http_method: String,
    /// Always sent empty; query strings are not decoded out of the route.
    pub query_string_parameters: BTreeMap<String, String>,
    pub body: String,
}

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: &'a Map<String, Value>,
}

impl RequestEnvelope {
    /// `POST` envelope carrying `{"query", "variables"}` as its body.
    #[must_use]
    pub fn graphql(
        principal: &Principal,
        path: &str,
        query: &str,
        variables: &Map<String, Value>,
    ) -> Self {
        let body = encode_json("GraphQL request body", &GraphQlRequest { query, variables });
        Self {
            headers: principal.auth_headers(),
            path: path.to_owned(),
            http_method: Method::POST.as_str().to_owned(),
            query_string_parameters: BTreeMap::new(),
            body,
        }
    }

    /// Envelope for an arbitrary request.
    ///
    /// Fixed auth headers come first; caller headers are added only when they
    /// do not collide with one of them, using their first value.
    #[must_use]
    pub fn http(
        principal: &Principal,
        method: &Method,
        path: &str,
        caller_headers: &CallerHeaders,
        body: String,
    ) -> Self {
        let mut headers = principal.auth_headers();
        merge_caller_headers(&mut headers, caller_headers);
        Self {
            headers,
            path: path.to_owned(),
            http_method: method.as_str().to_owned(),
            query_string_parameters: BTreeMap::new(),
            body,
        }
    }

    /// Serialized invocation payload.
    #[must_use]
    pub fn to_payload(&self) -> Bytes {
        Bytes::from(encode_json("invocation envelope", self))
    }
}

/// Envelope returned by the invoked function.
///
/// Missing or `null` fields decode to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status_code: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: BTreeMap<String, String>,
}

impl ResponsePayload {
    /// Decode raw invocation output.
    ///
    /// # Errors
    /// Returns [`ClientError::MalformedResponse`] if `bytes` is not a response envelope.
    pub fn decode(bytes: &[u8]) -> Result<Self, ClientError> {
        serde_json::from_slice(bytes).map_err(|e| ClientError::malformed("response envelope", &e))
    }

    /// Decode the body as a GraphQL response.
    ///
    /// # Errors
    /// Returns [`ClientError::MalformedResponse`] if the body is not a GraphQL
    /// response, or [`ClientError::Remote`] with the first reported error message.
    pub fn into_graphql_data(self) -> Result<Map<String, Value>, ClientError> {
        let response: GraphQlResponse = serde_json::from_str(&self.body)
            .map_err(|e| ClientError::malformed("GraphQL response body", &e))?;
        response.into_result()
    }
}

/// One entry of a GraphQL `errors` array. Extra fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GraphQlError {
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
}

/// GraphQL response carried in [`ResponsePayload::body`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: Vec<GraphQlError>,
}

impl GraphQlResponse {
    /// `data` if no errors were reported. Only the first error is kept.
    ///
    /// # Errors
    /// Returns [`ClientError::Remote`] if `errors` is non-empty.
    pub fn into_result(self) -> Result<Map<String, Value>, ClientError> {
        match self.errors.into_iter().next() {
            Some(first) => Err(ClientError::Remote(first.message)),
            None => Ok(self.data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{AccessPolicy, CONTENT_TYPE_HEADER, USER_HEADER};
    use http::HeaderValue;
    use serde_json::json;

    fn principal() -> Principal {
        Principal::new(
            "acct",
            "user-1",
            AccessPolicy::default().with_rule("read", true),
        )
    }

    #[test]
    fn test_graphql_envelope_shape() {
        let mut vars = Map::new();
        vars.insert("id".to_owned(), json!(7));
        let envelope = RequestEnvelope::graphql(&principal(), "/v1/graphql", "query{x}", &vars);

        let wire: Value = serde_json::from_slice(&envelope.to_payload()).unwrap();
        assert_eq!(wire["httpMethod"], "POST");
        assert_eq!(wire["path"], "/v1/graphql");
        assert_eq!(wire["queryStringParameters"], json!({}));
        assert_eq!(wire["headers"]["LifeOmic-Account"], "acct");
        assert_eq!(
            wire["headers"]["LifeOmic-Policy"],
            r#"{"rules":{"read":true}}"#
        );

        let inner: Value = serde_json::from_str(wire["body"].as_str().unwrap()).unwrap();
        assert_eq!(inner, json!({"query": "query{x}", "variables": {"id": 7}}));
    }

    #[test]
    fn test_graphql_envelope_with_no_variables() {
        let envelope = RequestEnvelope::graphql(&principal(), "/", "{a}", &Map::new());
        assert_eq!(envelope.body, r#"{"query":"{a}","variables":{}}"#);
    }

    #[test]
    fn test_http_envelope_keeps_method_and_fixed_headers() {
        let mut caller = CallerHeaders::new();
        caller.append("LifeOmic-User", HeaderValue::from_static("spoofed")).unwrap();
        caller.append("content-type", HeaderValue::from_static("text/csv")).unwrap();
        caller.append("X-Custom", HeaderValue::from_static("1")).unwrap();

        let envelope = RequestEnvelope::http(
            &principal(),
            &Method::DELETE,
            "/items/3",
            &caller,
            "payload".to_owned(),
        );

        assert_eq!(envelope.http_method, "DELETE");
        assert_eq!(envelope.path, "/items/3");
        assert_eq!(envelope.body, "payload");
        assert!(envelope.query_string_parameters.is_empty());
        assert_eq!(envelope.headers[USER_HEADER], "user-1");
        assert_eq!(envelope.headers[CONTENT_TYPE_HEADER], "application/json");
        assert_eq!(envelope.headers["X-Custom"], "1");
        assert_eq!(envelope.headers.len(), 5);
    }

    #[test]
    fn test_decode_response_payload() {
        let payload = ResponsePayload::decode(
            br#"{"body":"hello","statusCode":404,"headers":{"X-Test":"v"}}"#,
        )
        .unwrap();
        assert_eq!(payload.body, "hello");
        assert_eq!(payload.status_code, 404);
        assert_eq!(payload.headers["X-Test"], "v");
    }

    #[test]
    fn test_decode_tolerates_null_and_missing_fields() {
        let payload = ResponsePayload::decode(br#"{"body":null,"headers":null}"#).unwrap();
        assert_eq!(payload, ResponsePayload::default());
    }

    #[test]
    fn test_decode_rejects_non_json() {
        let err = ResponsePayload::decode(b"Internal Server Error").unwrap_err();
        assert!(matches!(err, ClientError::MalformedResponse(_)));
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        let err = ResponsePayload::decode(br#"{"body":{"nested":true}}"#).unwrap_err();
        assert!(matches!(err, ClientError::MalformedResponse(_)));
    }

    #[test]
    fn test_graphql_data_returned_without_errors() {
        let payload = ResponsePayload {
            body: r#"{"data":{"x":1},"errors":[]}"#.to_owned(),
            ..ResponsePayload::default()
        };
        let data = payload.into_graphql_data().unwrap();
        assert_eq!(Value::Object(data), json!({"x": 1}));
    }

    #[test]
    fn test_graphql_first_error_wins() {
        let payload = ResponsePayload {
            body: r#"{"data":{},"errors":[{"message":"boom"},{"message":"second"}]}"#.to_owned(),
            ..ResponsePayload::default()
        };
        let err = payload.into_graphql_data().unwrap_err();
        assert!(matches!(&err, ClientError::Remote(m) if m == "boom"));
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_graphql_null_data_with_error() {
        let response: GraphQlResponse = serde_json::from_str(
            r#"{"data":null,"errors":[{"message":"denied","path":["x"]}]}"#,
        )
        .unwrap();
        assert!(response.data.is_empty());
        assert!(matches!(response.into_result(), Err(ClientError::Remote(m)) if m == "denied"));
    }

    #[test]
    fn test_graphql_null_error_message_is_empty() {
        let payload = ResponsePayload {
            body: r#"{"data":null,"errors":[{"message":null}]}"#.to_owned(),
            ..ResponsePayload::default()
        };
        let err = payload.into_graphql_data().unwrap_err();
        assert!(matches!(&err, ClientError::Remote(m) if m.is_empty()));
    }

    #[test]
    fn test_graphql_body_not_json_is_malformed() {
        let payload = ResponsePayload {
            body: "<html>".to_owned(),
            ..ResponsePayload::default()
        };
        assert!(matches!(
            payload.into_graphql_data(),
            Err(ClientError::MalformedResponse(_))
        ));
    }
}
