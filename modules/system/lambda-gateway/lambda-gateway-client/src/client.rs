use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::config::TransportConfig;
use crate::envelope::{RequestEnvelope, ResponsePayload};
use crate::error::ClientError;
use crate::invoker::Invoker;
use crate::policy::{AccessPolicy, Principal};
use crate::request::Request;
use crate::response::Response;
use crate::route::Route;

/// Client that addresses functions by routing string and speaks GraphQL or
/// plain HTTP to them.
///
/// Immutable after construction. Cloning is cheap and clones share the
/// transport, so one client can serve concurrent callers.
#[derive(Clone)]
pub struct Client {
    invoker: Arc<dyn Invoker>,
    principal: Principal,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("account", &self.principal.account())
            .field("user", &self.principal.user())
            .field("rules", &self.principal.policy().rules.len())
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client over an existing transport.
    #[must_use]
    pub fn new(invoker: Arc<dyn Invoker>, principal: Principal) -> Self {
        Self { invoker, principal }
    }

    /// Create a client with the transport described by `LAMBDA_GW_*` variables
    /// and the AWS default credential chain.
    ///
    /// # Errors
    /// Returns [`ClientError::Configuration`] if the transport cannot be resolved.
    pub async fn build(
        account: impl Into<String>,
        user: impl Into<String>,
        rules: BTreeMap<String, bool>,
    ) -> Result<Self, ClientError> {
        let config = TransportConfig::from_env()?;
        Self::connect(&config, account, user, rules).await
    }

    /// Create a client with an explicit transport configuration.
    ///
    /// # Errors
    /// Returns [`ClientError::Configuration`] if the transport cannot be resolved.
    pub async fn connect(
        config: &TransportConfig,
        account: impl Into<String>,
        user: impl Into<String>,
        rules: BTreeMap<String, bool>,
    ) -> Result<Self, ClientError> {
        let invoker = config.connect().await?;
        Ok(Self::new(
            invoker,
            Principal::new(account, user, AccessPolicy::new(rules)),
        ))
    }

    #[must_use]
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Bind a constant routing prefix, e.g. `"billing-service:live/v1"`.
    #[must_use]
    pub fn scoped(&self, prefix: impl Into<String>) -> ScopedClient {
        ScopedClient {
            client: self.clone(),
            prefix: prefix.into(),
        }
    }

    /// Run a GraphQL query against the function named in `route`.
    ///
    /// # Arguments
    /// * `route` - `<function>/<path>`, e.g. `"users-service/v1/graphql"`
    /// * `query` - GraphQL document
    /// * `variables` - query variables
    ///
    /// # Errors
    /// [`ClientError::InvalidRoute`] for a route without `/`,
    /// [`ClientError::Invocation`] if the call fails,
    /// [`ClientError::MalformedResponse`] if either response layer does not decode,
    /// [`ClientError::Remote`] with the first GraphQL error message.
    pub async fn gql(
        &self,
        route: &str,
        query: &str,
        variables: &Map<String, Value>,
    ) -> Result<Map<String, Value>, ClientError> {
        let route = Route::parse(route)?;
        let envelope = RequestEnvelope::graphql(&self.principal, route.path(), query, variables);
        let payload = self.invoke(route.function(), &envelope).await?;
        payload.into_graphql_data()
    }

    /// Like [`Client::gql`], deserializing `data` into `T`.
    ///
    /// # Errors
    /// As [`Client::gql`], plus [`ClientError::MalformedResponse`] if `data`
    /// does not match `T`.
    pub async fn gql_as<T: DeserializeOwned>(
        &self,
        route: &str,
        query: &str,
        variables: &Map<String, Value>,
    ) -> Result<T, ClientError> {
        let data = self.gql(route, query, variables).await?;
        serde_json::from_value(Value::Object(data))
            .map_err(|e| ClientError::malformed("GraphQL data", &e))
    }

    /// Send an HTTP-shaped request to the function named in its route.
    ///
    /// The body is read into memory before invocation. Caller headers that
    /// collide with the fixed auth headers are dropped, and multi-valued
    /// headers are forwarded with their first value only.
    ///
    /// # Errors
    /// [`ClientError::InvalidRoute`] for a route without `/`,
    /// [`ClientError::Io`] if the body cannot be read,
    /// [`ClientError::Invocation`] if the call fails,
    /// [`ClientError::MalformedResponse`] if the response envelope does not decode.
    /// A status or header the function returns is passed through unchecked.
    pub async fn send(&self, request: Request) -> Result<Response, ClientError> {
        let (method, route, headers, body) = request.into_parts();
        let route = Route::parse(&route)?;
        let body = body.collect_string().await?;
        let envelope =
            RequestEnvelope::http(&self.principal, &method, route.path(), &headers, body);
        let payload = self.invoke(route.function(), &envelope).await?;
        Ok(Response::from_payload(payload))
    }

    /// Blocking version of [`Client::gql`] for sync contexts.
    ///
    /// # Errors
    /// As [`Client::gql`], plus [`ClientError::Io`] if no runtime can be started.
    ///
    /// # Panics
    /// Panics if called from within an async runtime.
    pub fn gql_blocking(
        &self,
        route: &str,
        query: &str,
        variables: &Map<String, Value>,
    ) -> Result<Map<String, Value>, ClientError> {
        block_on(self.gql(route, query, variables))?
    }

    /// Blocking version of [`Client::send`] for sync contexts.
    ///
    /// # Errors
    /// As [`Client::send`], plus [`ClientError::Io`] if no runtime can be started.
    ///
    /// # Panics
    /// Panics if called from within an async runtime.
    pub fn send_blocking(&self, request: Request) -> Result<Response, ClientError> {
        block_on(self.send(request))?
    }

    async fn invoke(
        &self,
        function: &str,
        envelope: &RequestEnvelope,
    ) -> Result<ResponsePayload, ClientError> {
        let payload = envelope.to_payload();
        tracing::debug!(
            function,
            method = %envelope.http_method,
            path = %envelope.path,
            payload_len = payload.len(),
            "invoking function"
        );

        let raw = self.invoker.invoke(function, payload).await?;
        let response = ResponsePayload::decode(&raw)?;
        tracing::debug!(
            function,
            status = response.status_code,
            payload_len = raw.len(),
            "function responded"
        );
        Ok(response)
    }
}

fn block_on<F: Future>(future: F) -> Result<F::Output, ClientError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}

/// [`Client`] with a fixed routing prefix prepended to every route.
#[derive(Debug, Clone)]
pub struct ScopedClient {
    client: Client,
    prefix: String,
}

impl ScopedClient {
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// [`Client::gql`] on `prefix + path`.
    ///
    /// # Errors
    /// As [`Client::gql`].
    pub async fn gql(
        &self,
        path: &str,
        query: &str,
        variables: &Map<String, Value>,
    ) -> Result<Map<String, Value>, ClientError> {
        let route = format!("{}{path}", self.prefix);
        self.client.gql(&route, query, variables).await
    }

    /// [`Client::send`] with `prefix` prepended to the request route.
    ///
    /// # Errors
    /// As [`Client::send`].
    pub async fn send(&self, mut request: Request) -> Result<Response, ClientError> {
        request.prefix_route(&self.prefix);
        self.client.send(request).await
    }
}
