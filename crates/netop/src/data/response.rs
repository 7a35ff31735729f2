use std::slice;

use bytes::Bytes;
use netop_codec::{DecodeError, TextEncoding};

/// Response headers in wire order.
///
/// Lookups are case-insensitive; repeated names (`Set-Cookie`) are kept as
/// separate entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> { self.get_all(name).next() }

    pub fn get_all<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> {
        self.entries
            .iter()
            .filter(move |(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool { self.get(name).is_some() }

    pub fn iter(&self) -> slice::Iter<'_, (String, String)> { self.entries.iter() }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Declared `Content-Length`, if present and numeric.
    pub fn content_length(&self) -> Option<u64> { self.get("content-length")?.trim().parse().ok() }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Headers {
    type IntoIter = slice::Iter<'a, (String, String)>;
    type Item = &'a (String, String);

    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

/// A cookie received in a `Set-Cookie` header. Not persisted anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name:      String,
    pub value:     String,
    pub domain:    String,
    pub path:      String,
    /// Raw `Expires` attribute.
    pub expires:   Option<String>,
    pub max_age:   Option<i64>,
    pub secure:    bool,
    pub http_only: bool,
}

/// Outcome of a finished operation. Read-only.
#[derive(Debug, Clone)]
pub struct ResponseRecord {
    pub status_code:       u16,
    pub status_message:    String,
    pub headers:           Headers,
    /// Body after gzip inflation, when that applied.
    pub body:              Bytes,
    /// Encoding used by [`text`](Self::text).
    pub encoding:          TextEncoding,
    /// Whether `encoding` came from the server's `Content-Type`.
    pub encoding_declared: bool,
    pub cookies:           Vec<Cookie>,
    /// Bytes received on the wire for the final attempt.
    pub content_length:    u64,
}

impl ResponseRecord {
    pub fn text(&self) -> Result<String, DecodeError> { self.encoding.decode(&self.body) }

    pub fn is_success(&self) -> bool { (200..300).contains(&self.status_code) }

    pub fn header(&self, name: &str) -> Option<&str> { self.headers.get(name) }
}
