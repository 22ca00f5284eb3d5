//! Lambda Gateway Client
//!
//! Calls backend services that are deployed as functions and reached through
//! the synchronous Lambda `Invoke` API instead of an HTTP listener.
//!
//! Each call is addressed by a routing string `<function>/<path>`. The client
//! wraps the request in a proxy-event envelope, stamps the caller's account,
//! user and access policy onto it as headers, invokes the function once and
//! translates the function's response envelope back into either GraphQL `data`
//! or an HTTP [`Response`].
//!
//! There are no retries and no client-side deadlines. Dropping a pending call
//! cancels it.
//!
//! # Examples
//!
//! ## GraphQL
//!
//! ```no_run
//! use lambda_gateway_client::{AccessPolicy, Client, Principal, TransportConfig};
//! use serde_json::{Map, json};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TransportConfig::from_env()?;
//! let policy = AccessPolicy::default().with_rule("readData", true);
//! let client = Client::new(config.connect().await?, Principal::new("acct", "user-1", policy));
//!
//! let mut variables = Map::new();
//! variables.insert("id".to_owned(), json!("p-1"));
//! let data = client
//!     .gql("users-service/v1/graphql", "query($id: ID!) { user(id: $id) { name } }", &variables)
//!     .await?;
//! println!("{}", data["user"]["name"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## HTTP
//!
//! ```no_run
//! use lambda_gateway_client::{Client, Method, Request};
//! use std::collections::BTreeMap;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::build("acct", "user-1", BTreeMap::new()).await?;
//!
//! let request = Request::builder()
//!     .method(Method::GET)
//!     .route("files-service/v1/files/42")
//!     .header("accept", "application/json")?
//!     .build()?;
//!
//! let response = client.send(request).await?;
//! let file: serde_json::Value = response.json()?;
//! # Ok(())
//! # }
//! ```

mod body;
mod client;
mod config;
mod emulator;
mod envelope;
mod error;
mod invoker;
mod lambda;
mod policy;
mod request;
mod response;
mod route;

// Re-export public API
pub use body::{Body, BoxStream};
pub use client::{Client, ScopedClient};
pub use config::{ENV_PREFIX, TransportConfig};
pub use emulator::EmulatorInvoker;
pub use envelope::{GraphQlError, GraphQlResponse, RequestEnvelope, ResponsePayload};
pub use error::ClientError;
pub use invoker::Invoker;
pub use lambda::LambdaInvoker;
pub use policy::{
    ACCOUNT_HEADER, AccessPolicy, CONTENT_TYPE_HEADER, EnvelopeHeaders, POLICY_HEADER, Principal,
    USER_HEADER, is_fixed_header,
};
pub use request::{CallerHeaders, Request, RequestBuilder};
pub use response::Response;
pub use route::Route;

// Re-export commonly used types from dependencies
pub use bytes::Bytes;
pub use http::{HeaderValue, Method, StatusCode};
