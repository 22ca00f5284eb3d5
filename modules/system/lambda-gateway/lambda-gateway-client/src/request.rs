use http::{HeaderName, HeaderValue, Method};
use serde::Serialize;

use crate::body::Body;
use crate::error::ClientError;

/// Caller headers in insertion order, each name spelled exactly as given.
///
/// Lookups ignore ASCII case and the first matching entry wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerHeaders {
    entries: Vec<(String, HeaderValue)>,
}

impl CallerHeaders {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header, keeping any earlier value under the same name.
    ///
    /// # Errors
    /// Returns [`ClientError::Build`] if `name` is not a valid HTTP header name.
    pub fn append(
        &mut self,
        name: impl Into<String>,
        value: HeaderValue,
    ) -> Result<(), ClientError> {
        let name = name.into();
        HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ClientError::Build(format!("Invalid header name: {e}")))?;
        self.entries.push((name, value));
        Ok(())
    }

    /// First value stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    /// Every value stored under `name`, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a HeaderValue> + 'a {
        self.entries
            .iter()
            .filter(move |(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    /// `(name, value)` pairs in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// HTTP-shaped request addressed by a routing string (`<function>/<path>`).
#[derive(Debug)]
pub struct Request {
    method: Method,
    route: String,
    headers: CallerHeaders,
    body: Body,
}

impl Request {
    /// Create a new request builder
    #[must_use]
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Routing string, `<function>/<path>`.
    #[must_use]
    pub fn route(&self) -> &str {
        &self.route
    }

    #[must_use]
    pub fn headers(&self) -> &CallerHeaders {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut CallerHeaders {
        &mut self.headers
    }

    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    pub(crate) fn prefix_route(&mut self, prefix: &str) {
        self.route.insert_str(0, prefix);
    }

    /// Split into method, route, headers and body.
    #[must_use]
    pub fn into_parts(self) -> (Method, String, CallerHeaders, Body) {
        (self.method, self.route, self.headers, self.body)
    }
}

/// Builder for constructing requests with a fluent API
#[derive(Debug, Default)]
pub struct RequestBuilder {
    method: Option<Method>,
    route: Option<String>,
    headers: CallerHeaders,
    body: Body,
}

impl RequestBuilder {
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Set the routing string, e.g. `"my-function/v1/items"`.
    #[must_use]
    pub fn route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    /// Append a header. The name is forwarded with the spelling given here.
    /// Repeated names keep every value on the request; only the first one is
    /// forwarded to the function.
    ///
    /// # Errors
    /// Returns [`ClientError::Build`] if the name or value is not valid HTTP.
    pub fn header<V>(mut self, key: impl Into<String>, value: V) -> Result<Self, ClientError>
    where
        V: TryInto<HeaderValue>,
        V::Error: std::fmt::Display,
    {
        let value = value
            .try_into()
            .map_err(|e| ClientError::Build(format!("Invalid header value: {e}")))?;
        self.headers.append(key, value)?;
        Ok(self)
    }

    /// Set the body to a JSON-serialized value.
    ///
    /// No content type is added; the envelope always carries `application/json`.
    ///
    /// # Errors
    /// Returns [`ClientError::Build`] if `value` cannot be serialized.
    pub fn json<T: Serialize>(mut self, value: &T) -> Result<Self, ClientError> {
        self.body = Body::from_json(value)?;
        Ok(self)
    }

    #[must_use]
    pub fn body<B: Into<Body>>(mut self, body: B) -> Self {
        self.body = body.into();
        self
    }

    /// Build the request. Defaults to `GET`.
    ///
    /// # Errors
    /// Returns [`ClientError::Build`] if no route was set.
    pub fn build(self) -> Result<Request, ClientError> {
        let method = self.method.unwrap_or(Method::GET);
        let route = self
            .route
            .ok_or_else(|| ClientError::Build("Request route is required".into()))?;

        Ok(Request {
            method,
            route,
            headers: self.headers,
            body: self.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults_to_get() {
        let request = Request::builder().route("svc/items").build().unwrap();
        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.route(), "svc/items");
        assert!(request.body().is_empty());
    }

    #[test]
    fn test_builder_requires_route() {
        let err = Request::builder().method(Method::POST).build().unwrap_err();
        assert!(matches!(err, ClientError::Build(_)));
    }

    #[test]
    fn test_builder_rejects_invalid_header_name() {
        let err = Request::builder().header("bad header", "v").unwrap_err();
        assert!(matches!(err, ClientError::Build(_)));
    }

    #[test]
    fn test_repeated_header_keeps_all_values() {
        let request = Request::builder()
            .route("svc/items")
            .header("accept", "a")
            .unwrap()
            .header("accept", "b")
            .unwrap()
            .build()
            .unwrap();
        let values: Vec<_> = request.headers().get_all("accept").collect();
        assert_eq!(values.len(), 2);
        assert_eq!(request.headers().get("Accept").unwrap(), "a");
    }

    #[test]
    fn test_header_name_spelling_is_kept() {
        let request = Request::builder()
            .route("svc/items")
            .header("X-Request-Id", "r-1")
            .unwrap()
            .header("authorization", "Bearer t")
            .unwrap()
            .build()
            .unwrap();
        let names: Vec<&str> = request.headers().entries().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["X-Request-Id", "authorization"]);
        assert_eq!(request.headers().get("x-request-id").unwrap(), "r-1");
    }

    #[test]
    fn test_builder_rejects_invalid_header_value() {
        let err = Request::builder().header("x-a", "line\nbreak").unwrap_err();
        assert!(matches!(err, ClientError::Build(_)));
    }
}
