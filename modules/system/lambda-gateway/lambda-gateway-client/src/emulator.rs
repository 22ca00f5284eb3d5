use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use url::Url;

use crate::error::ClientError;
use crate::invoker::Invoker;

const FUNCTION_ERROR_HEADER: &str = "x-amz-function-error";

/// Invokes functions over plain HTTP against an endpoint that speaks the Lambda
/// `Invoke` REST shape, such as the Runtime Interface Emulator or
/// `sam local start-lambda`. Requests are not signed.
#[derive(Debug, Clone)]
pub struct EmulatorInvoker {
    base_url: Url,
    http_client: reqwest::Client,
}

impl EmulatorInvoker {
    /// Create an invoker for `base_url`. No timeout is applied unless a
    /// non-zero one is given.
    ///
    /// # Errors
    /// Returns [`ClientError::Configuration`] if the URL is not an absolute
    /// `http`/`https` URL or the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            ClientError::Configuration(format!("invalid emulator URL `{base_url}`: {e}"))
        })?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(ClientError::Configuration(format!(
                "emulator URL must be http(s): `{base_url}`"
            )));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout.filter(|t| !t.is_zero()) {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    /// `{base}/2015-03-31/functions/{function}/invocations`, with `function`
    /// percent-encoded as a single segment.
    fn invocation_url(&self, function: &str) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ClientError::Configuration(format!("cannot extend URL `{}`", self.base_url))
            })?
            .pop_if_empty()
            .extend(["2015-03-31", "functions", function, "invocations"]);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl Invoker for EmulatorInvoker {
    async fn invoke(&self, function: &str, payload: Bytes) -> Result<Bytes, ClientError> {
        let url = self.invocation_url(function)?;

        let resp = self
            .http_client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| ClientError::Invocation(e.to_string()))?;

        let status = resp.status();
        let function_error = resp
            .headers()
            .get(FUNCTION_ERROR_HEADER)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());
        let body = resp
            .bytes()
            .await
            .map_err(|e| ClientError::Invocation(e.to_string()))?;

        if !status.is_success() {
            return Err(ClientError::Invocation(format!(
                "invoke returned {status}: {}",
                String::from_utf8_lossy(&body)
            )));
        }
        if let Some(kind) = function_error {
            tracing::warn!(function, kind = %kind, "function reported an error");
            return Err(ClientError::Invocation(format!(
                "function error ({kind}): {}",
                String::from_utf8_lossy(&body)
            )));
        }

        Ok(body)
    }
}
