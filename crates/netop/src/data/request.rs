use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use bytes::Bytes;
use netop_codec::{Attachment, ParamValue, Params, TextEncoding};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::data::config::OperationConfig;
use crate::error::ConfigurationError;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Head,
    Patch,
    Options,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Patch => "PATCH",
            Method::Options => "OPTIONS",
        }
    }

    /// Methods whose parameters travel in the body rather than the query.
    pub fn carries_body(self) -> bool { matches!(self, Method::Post | Method::Put | Method::Patch) }
}

impl FromStr for Method {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "HEAD" => Ok(Method::Head),
            "PATCH" => Ok(Method::Patch),
            "OPTIONS" => Ok(Method::Options),
            _ => Err(ConfigurationError::InvalidMethod(s.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Cache behavior requested from the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    UseProtocolCachePolicy,
    #[default]
    ReloadIgnoringLocalCacheData,
    ReturnCacheDataElseLoad,
    ReturnCacheDataDontLoad,
}

/// Backlog ordering. Higher priorities are admitted first; equal priorities
/// keep submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    VeryLow,
    Low,
    #[default]
    Normal,
    High,
    VeryHigh,
}

/// Everything needed to issue one request.
///
/// Mutable until the owning operation is submitted, frozen afterwards.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub url:          Url,
    pub method:       Method,
    pub content_type: Option<String>,
    pub accept:       Option<String>,
    /// Names are unique, compared case-insensitively.
    pub headers:      HashMap<String, String>,
    pub params:       Params,
    /// Raw body; when set, parameters move to the query string.
    pub body:         Option<Bytes>,
    pub attachment:   Option<Attachment>,
    pub priority:     Priority,
    pub config:       OperationConfig,
}

impl RequestSpec {
    pub fn new(method: Method, url: &str) -> Result<Self, ConfigurationError> {
        let url = Url::parse(url).map_err(|e| ConfigurationError::InvalidUrl {
            url:    url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_url(method, url))
    }

    pub fn from_url(method: Method, url: Url) -> Self {
        Self {
            url,
            method,
            content_type: None,
            accept: None,
            headers: HashMap::new(),
            params: Params::new(),
            body: None,
            attachment: None,
            priority: Priority::default(),
            config: OperationConfig::default(),
        }
    }

    pub fn get(url: &str) -> Result<Self, ConfigurationError> { Self::new(Method::Get, url) }

    pub fn post(url: &str) -> Result<Self, ConfigurationError> { Self::new(Method::Post, url) }

    /// Insert or replace a header, matching existing names case-insensitively.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.params.insert(name.into(), value.into());
    }

    /// Whether the body has to be sent as multipart.
    pub fn needs_multipart(&self) -> bool {
        self.attachment.is_some() || self.params.values().any(ParamValue::is_binary)
    }

    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    #[must_use]
    pub fn accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.set_param(name, value);
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn config(mut self, config: OperationConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_interval = timeout;
        self
    }

    #[must_use]
    pub fn retries_on_timeout(mut self, retries: u32) -> Self {
        self.config.number_of_times_to_retry_on_timeout = retries;
        self
    }

    #[must_use]
    pub fn should_timeout(mut self, enabled: bool) -> Self {
        self.config.should_timeout = enabled;
        self
    }

    #[must_use]
    pub fn compress_body(mut self, enabled: bool) -> Self {
        self.config.should_compress_request_body = enabled;
        self
    }

    #[must_use]
    pub fn allow_compressed_response(mut self, enabled: bool) -> Self {
        self.config.allow_compressed_response = enabled;
        self
    }

    #[must_use]
    pub fn cache_policy(mut self, policy: CachePolicy) -> Self {
        self.config.cache_policy = policy;
        self
    }

    #[must_use]
    pub fn default_response_encoding(mut self, encoding: TextEncoding) -> Self {
        self.config.default_response_encoding = encoding;
        self
    }

    #[must_use]
    pub fn retry_backoff(mut self, base: Duration) -> Self {
        self.config.retry_backoff = base;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parsing() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!(" Patch ".parse::<Method>().unwrap(), Method::Patch);
        assert!(matches!("BREW".parse::<Method>(), Err(ConfigurationError::InvalidMethod(_))));
        assert!(Method::Post.carries_body());
        assert!(!Method::Delete.carries_body());
    }

    #[test]
    fn test_invalid_url() {
        let err = RequestSpec::get("not a url").unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidUrl { .. }));
    }

    #[test]
    fn test_headers_replace_case_insensitively() {
        let spec = RequestSpec::get("https://example.test/")
            .unwrap()
            .header("X-Token", "a")
            .header("x-token", "b");

        assert_eq!(spec.headers.len(), 1);
        assert_eq!(spec.header_value("X-TOKEN"), Some("b"));
    }

    #[test]
    fn test_binary_param_needs_multipart() {
        let spec = RequestSpec::post("https://example.test/upload").unwrap().param("name", "x");
        assert!(!spec.needs_multipart());

        let spec = spec.param("blob", ParamValue::binary(vec![1, 2]));
        assert!(spec.needs_multipart());
    }

    #[test]
    fn test_priority_order() {
        assert!(Priority::VeryHigh > Priority::High);
        assert!(Priority::Normal > Priority::Low);
        assert_eq!(Priority::default(), Priority::Normal);
    }
}
