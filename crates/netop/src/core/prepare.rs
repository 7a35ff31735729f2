use bytes::Bytes;
use netop_codec::{EncodeError, encode_multipart, encode_parameters, maybe_compress};
use url::Url;

use crate::data::{CachePolicy, Method, RequestSpec};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A fully encoded request, built once per operation and reused verbatim by
/// every attempt.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method:         Method,
    /// Final URL, query string included.
    pub url:            Url,
    pub headers:        Vec<(String, String)>,
    pub body:           Bytes,
    pub cache_policy:   CachePolicy,
    /// Length of `body` as sent (after compression).
    pub content_length: u64,
}

impl TransportRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Encode `spec` into the request every attempt will send.
///
/// Body selection, first match wins:
/// 1. a raw body override, with parameters moved to the query string
/// 2. multipart, when an attachment or a binary parameter is present
/// 3. form-encoded parameters in the body for POST, PUT and PATCH
/// 4. form-encoded parameters in the query string otherwise
pub fn prepare_request(spec: &RequestSpec) -> Result<TransportRequest, EncodeError> {
    let mut url = spec.url.clone();
    let mut headers: Vec<(String, String)> =
        spec.headers.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    headers.sort();

    if let Some(content_type) = &spec.content_type {
        set_header(&mut headers, "Content-Type", content_type);
    }

    let body: Vec<u8> = if let Some(raw) = &spec.body {
        append_query(&mut url, &encode_parameters(&spec.params));
        raw.to_vec()
    } else if spec.needs_multipart() {
        let multipart = encode_multipart(&spec.params, spec.attachment.as_ref())?;
        set_header(&mut headers, "Content-Type", &multipart.content_type());
        multipart.body
    } else if spec.method.carries_body() {
        let body = encode_parameters(&spec.params);
        if !body.is_empty() && !has_header(&headers, "Content-Type") {
            set_header(&mut headers, "Content-Type", FORM_CONTENT_TYPE);
        }
        body
    } else {
        append_query(&mut url, &encode_parameters(&spec.params));
        Vec::new()
    };

    let compress = spec.config.should_compress_request_body && !body.is_empty();
    let body = maybe_compress(body, compress)?;
    if compress {
        set_header(&mut headers, "Content-Encoding", "gzip");
    }

    if let Some(accept) = &spec.accept {
        set_header(&mut headers, "Accept", accept);
    }
    if spec.config.allow_compressed_response && !has_header(&headers, "Accept-Encoding") {
        set_header(&mut headers, "Accept-Encoding", "gzip");
    }

    Ok(TransportRequest {
        method: spec.method,
        url,
        headers,
        content_length: body.len() as u64,
        body: Bytes::from(body),
        cache_policy: spec.config.cache_policy,
    })
}

fn has_header(headers: &[(String, String)], name: &str) -> bool {
    headers.iter().any(|(existing, _)| existing.eq_ignore_ascii_case(name))
}

fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
    headers.push((name.to_string(), value.to_string()));
}

fn append_query(url: &mut Url, encoded: &[u8]) {
    if encoded.is_empty() {
        return;
    }
    let encoded = String::from_utf8_lossy(encoded);
    let query = match url.query() {
        Some(existing) if !existing.is_empty() => format!("{existing}&{encoded}"),
        _ => encoded.into_owned(),
    };
    url.set_query(Some(&query));
}
