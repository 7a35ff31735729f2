use url::Url;

use crate::data::{Cookie, Headers};

/// Parse every `Set-Cookie` header of a response received from `url`.
///
/// Malformed entries (no `name=value` pair) are skipped.
pub fn cookies_from_headers(headers: &Headers, url: &Url) -> Vec<Cookie> {
    let host = url.host_str().unwrap_or_default();
    headers
        .get_all("set-cookie")
        .filter_map(|value| parse_set_cookie(value, host))
        .collect()
}

/// Parse one `Set-Cookie` value. `default_domain` applies when the cookie
/// names no `Domain`.
pub fn parse_set_cookie(value: &str, default_domain: &str) -> Option<Cookie> {
    let mut parts = value.split(';');
    let (name, cookie_value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let mut cookie = Cookie {
        name:      name.to_string(),
        value:     cookie_value.trim().trim_matches('"').to_string(),
        domain:    default_domain.to_ascii_lowercase(),
        path:      "/".to_string(),
        expires:   None,
        max_age:   None,
        secure:    false,
        http_only: false,
    };

    for attribute in parts {
        let (key, val) = match attribute.split_once('=') {
            Some((key, val)) => (key.trim(), val.trim()),
            None => (attribute.trim(), ""),
        };
        match key.to_ascii_lowercase().as_str() {
            "domain" if !val.is_empty() => {
                cookie.domain = val.trim_start_matches('.').to_ascii_lowercase();
            }
            "path" if val.starts_with('/') => cookie.path = val.to_string(),
            "expires" if !val.is_empty() => cookie.expires = Some(val.to_string()),
            "max-age" => cookie.max_age = val.parse().ok(),
            "secure" => cookie.secure = true,
            "httponly" => cookie.http_only = true,
            _ => {}
        }
    }

    Some(cookie)
}
