use aws_config::{BehaviorVersion, Region};
use aws_sdk_lambda::error::DisplayErrorContext;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::InvocationType;
use bytes::Bytes;

use crate::config::TransportConfig;
use crate::error::ClientError;
use crate::invoker::Invoker;

/// Invokes functions through the AWS Lambda `Invoke` API.
#[derive(Debug, Clone)]
pub struct LambdaInvoker {
    client: aws_sdk_lambda::Client,
}

impl LambdaInvoker {
    #[must_use]
    pub fn new(client: aws_sdk_lambda::Client) -> Self {
        Self { client }
    }

    /// Resolve region and credentials through the SDK default chain, with
    /// overrides from `config`.
    ///
    /// # Errors
    /// Returns [`ClientError::Configuration`] if no region or no credentials
    /// provider could be resolved.
    pub async fn from_config(config: &TransportConfig) -> Result<Self, ClientError> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(profile) = &config.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(endpoint_url) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }
        let sdk_config = loader.load().await;

        if sdk_config.region().is_none() {
            return Err(ClientError::Configuration(
                "no AWS region configured".to_owned(),
            ));
        }
        if sdk_config.credentials_provider().is_none() {
            return Err(ClientError::Configuration(
                "no AWS credentials provider available".to_owned(),
            ));
        }

        Ok(Self::new(aws_sdk_lambda::Client::new(&sdk_config)))
    }
}

#[async_trait::async_trait]
impl Invoker for LambdaInvoker {
    async fn invoke(&self, function: &str, payload: Bytes) -> Result<Bytes, ClientError> {
        let output = self
            .client
            .invoke()
            .function_name(function)
            .invocation_type(InvocationType::RequestResponse)
            .payload(Blob::new(payload.to_vec()))
            .send()
            .await
            .map_err(|e| ClientError::Invocation(DisplayErrorContext(&e).to_string()))?;

        let body = output
            .payload()
            .map_or_else(Bytes::new, |blob| Bytes::copy_from_slice(blob.as_ref()));

        if let Some(kind) = output.function_error() {
            tracing::warn!(function, kind, "function reported an error");
            return Err(ClientError::Invocation(format!(
                "function error ({kind}): {}",
                String::from_utf8_lossy(&body)
            )));
        }

        Ok(body)
    }
}
