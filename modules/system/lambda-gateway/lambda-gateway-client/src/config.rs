use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use serde::Deserialize;

use crate::emulator::EmulatorInvoker;
use crate::error::ClientError;
use crate::invoker::Invoker;
use crate::lambda::LambdaInvoker;

/// Prefix of the environment variables read by [`TransportConfig::from_env`].
pub const ENV_PREFIX: &str = "LAMBDA_GW_";

/// How to reach the invocation transport.
///
/// With `emulator_url` set, calls go over plain HTTP to that endpoint.
/// Otherwise the AWS SDK default chain is used, with `region`, `profile` and
/// `endpoint_url` as overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub region: Option<String>,
    pub profile: Option<String>,
    pub endpoint_url: Option<String>,
    pub emulator_url: Option<String>,
    /// Emulator transport only. Zero means no timeout.
    pub timeout_ms: Option<u64>,
}

impl TransportConfig {
    /// Configuration for an Invoke-API compatible HTTP endpoint.
    #[must_use]
    pub fn emulator(base_url: impl Into<String>) -> Self {
        Self {
            emulator_url: Some(base_url.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// Sub-millisecond remainders round up, so a non-zero timeout never
    /// becomes zero.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_micros().div_ceil(1000);
        self.timeout_ms = Some(u64::try_from(millis).unwrap_or(u64::MAX));
        self
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.filter(|ms| *ms > 0).map(Duration::from_millis)
    }

    /// Read `LAMBDA_GW_*` environment variables.
    ///
    /// # Errors
    /// Returns [`ClientError::Configuration`] if a variable has the wrong type.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::extract(&Figment::new().merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Read a YAML file, then let `LAMBDA_GW_*` variables override it.
    /// A missing file is treated as empty.
    ///
    /// # Errors
    /// Returns [`ClientError::Configuration`] if the file is not valid YAML or a
    /// value has the wrong type.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        Self::extract(
            &Figment::new()
                .merge(Yaml::file(path.as_ref()))
                .merge(Env::prefixed(ENV_PREFIX)),
        )
    }

    fn extract(figment: &Figment) -> Result<Self, ClientError> {
        figment
            .extract()
            .map_err(|e| ClientError::Configuration(e.to_string()))
    }

    /// Resolve the transport this configuration describes.
    ///
    /// # Errors
    /// Returns [`ClientError::Configuration`] if the transport cannot be set up.
    pub async fn connect(&self) -> Result<Arc<dyn Invoker>, ClientError> {
        if let Some(url) = &self.emulator_url {
            tracing::debug!(url = %url, "using emulator transport");
            Ok(Arc::new(EmulatorInvoker::new(url, self.timeout())?))
        } else {
            tracing::debug!(region = ?self.region, "using AWS Lambda transport");
            Ok(Arc::new(LambdaInvoker::from_config(self).await?))
        }
    }
}
