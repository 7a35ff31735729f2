//! Operation and queue configuration.
//!
//! Durations are (de)serialized as fractional seconds so a TOML file reads
//! naturally:
//!
//! ```toml
//! [operation]
//! timeout_interval = 2.5
//! number_of_times_to_retry_on_timeout = 1
//! default_response_encoding = "iso-8859-1"
//!
//! [queue]
//! max_concurrent_operations = 8
//! ```

use std::path::Path;
use std::time::Duration;

use netop_codec::TextEncoding;
use serde::{Deserialize, Serialize};

use crate::data::request::CachePolicy;
use crate::error::ConfigurationError;

/// Per-operation knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationConfig {
    /// Time an attempt may take before the timeout fires.
    ///
    /// Default: 10s
    #[serde(with = "seconds")]
    pub timeout_interval: Duration,

    /// Retries granted when an attempt times out. Other failures are never
    /// retried. Total attempts = 1 + this value.
    ///
    /// Default: 0
    pub number_of_times_to_retry_on_timeout: u32,

    /// Default: [`CachePolicy::ReloadIgnoringLocalCacheData`]
    pub cache_policy: CachePolicy,

    /// Gzip the request body and send `Content-Encoding: gzip`.
    ///
    /// Default: false
    pub should_compress_request_body: bool,

    /// Advertise `Accept-Encoding: gzip` and inflate gzip responses.
    ///
    /// Default: true
    pub allow_compressed_response: bool,

    /// When false no timer is armed and only transport failures end an
    /// attempt early.
    ///
    /// Default: true
    pub should_timeout: bool,

    /// Used by `response_text` when the server declares no charset.
    ///
    /// Default: UTF-8
    pub default_response_encoding: TextEncoding,

    /// Base delay before a timeout retry, doubled for each further retry.
    ///
    /// Default: 0 (retry immediately)
    #[serde(with = "seconds")]
    pub retry_backoff: Duration,
}

impl Default for OperationConfig {
    fn default() -> Self {
        Self {
            timeout_interval: Duration::from_secs(10),
            number_of_times_to_retry_on_timeout: 0,
            cache_policy: CachePolicy::default(),
            should_compress_request_body: false,
            allow_compressed_response: true,
            should_timeout: true,
            default_response_encoding: TextEncoding::Utf8,
            retry_backoff: Duration::ZERO,
        }
    }
}

impl OperationConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.should_timeout && self.timeout_interval.is_zero() {
            return Err(ConfigurationError::InvalidConfig(
                "timeout_interval must be positive when should_timeout is set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Queue-wide knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Upper bound on operations running at once in this queue.
    ///
    /// Default: 4
    pub max_concurrent_operations: usize,

    /// Cancel everything still queued or running as soon as one operation
    /// fails.
    ///
    /// Default: false
    pub cancel_all_on_failure: bool,

    /// Hold admissions until [`OperationQueue::resume`](crate::OperationQueue::resume).
    ///
    /// Default: false
    pub start_suspended: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_concurrent_operations: 4,
            cancel_all_on_failure: false,
            start_suspended: false,
        }
    }
}

impl QueueConfig {
    #[must_use]
    pub fn max_concurrent_operations(mut self, max: usize) -> Self {
        self.max_concurrent_operations = max;
        self
    }

    #[must_use]
    pub fn cancel_all_on_failure(mut self, enabled: bool) -> Self {
        self.cancel_all_on_failure = enabled;
        self
    }

    #[must_use]
    pub fn start_suspended(mut self, suspended: bool) -> Self {
        self.start_suspended = suspended;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.max_concurrent_operations == 0 {
            return Err(ConfigurationError::InvalidConfig(
                "max_concurrent_operations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub operation: OperationConfig,
    pub queue:     QueueConfig,
}

impl NetworkConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigurationError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigurationError::InvalidConfig(e.to_string()))?;
        config.operation.validate()?;
        config.queue.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigurationError> {
        toml::to_string(self).map_err(|e| ConfigurationError::InvalidConfig(e.to_string()))
    }
}

mod seconds {
    use std::time::Duration;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|e| D::Error::custom(format!("{secs} seconds: {e}")))
    }
}
