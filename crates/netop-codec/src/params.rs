//! `application/x-www-form-urlencoded` encoding and parsing.

use std::borrow::Cow;
use std::collections::BTreeMap;

use bytes::Bytes;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, percent_encode, utf8_percent_encode};

use crate::error::{DecodeError, Result};

/// Everything outside the RFC 3986 unreserved set gets escaped.
const FORM_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Request parameters keyed by name. Keys are unique; iteration is sorted so
/// encoded bodies are deterministic.
pub type Params = BTreeMap<String, ParamValue>;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),

    /// Binary payload. Forces a multipart body when present.
    Binary {
        data:         Bytes,
        file_name:    Option<String>,
        content_type: Option<String>,
    },
}

impl ParamValue {
    pub fn binary(data: impl Into<Bytes>) -> Self {
        Self::Binary {
            data:         data.into(),
            file_name:    None,
            content_type: None,
        }
    }

    pub fn is_binary(&self) -> bool { matches!(self, Self::Binary { .. }) }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary { .. } => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self { Self::Text(value.to_string()) }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self { Self::Text(value) }
}

impl From<Bytes> for ParamValue {
    fn from(value: Bytes) -> Self { Self::binary(value) }
}

impl From<Vec<u8>> for ParamValue {
    fn from(value: Vec<u8>) -> Self { Self::binary(value) }
}

/// Encode parameters as `key=value&key=value`.
///
/// Binary values are percent-encoded byte for byte. An empty mapping yields
/// an empty body.
pub fn encode_parameters(params: &Params) -> Vec<u8> {
    let mut out = String::new();
    for (key, value) in params {
        if !out.is_empty() {
            out.push('&');
        }
        out.extend(utf8_percent_encode(key, FORM_ESCAPE));
        out.push('=');
        match value {
            ParamValue::Text(text) => out.extend(utf8_percent_encode(text, FORM_ESCAPE)),
            ParamValue::Binary { data, .. } => out.extend(percent_encode(data, FORM_ESCAPE)),
        }
    }
    out.into_bytes()
}

/// Parse a form-encoded body back into text pairs.
///
/// Accepts both `+` and `%20` for spaces. Later duplicates of a key win.
pub fn decode_parameters(body: &[u8]) -> Result<BTreeMap<String, String>, DecodeError> {
    let text = std::str::from_utf8(body)
        .map_err(|e| DecodeError::MalformedForm(format!("body is not UTF-8: {e}")))?;

    let mut pairs = BTreeMap::new();
    for pair in text.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        pairs.insert(decode_component(key)?, decode_component(value)?);
    }
    Ok(pairs)
}

fn decode_component(raw: &str) -> Result<String, DecodeError> {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(Cow::into_owned)
        .map_err(|e| DecodeError::MalformedForm(format!("component {raw:?}: {e}")))
}
